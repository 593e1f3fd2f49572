//! In-memory session store.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::query::{
    domain::SessionId,
    ports::{SessionStore, SessionStoreError, SessionStoreResult},
};

/// Thread-safe in-memory session store.
///
/// Clones share the same record, so a test can hand one clone to an
/// orchestrator and later build a second orchestrator over another clone to
/// model a process restart.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    state: Arc<RwLock<Option<SessionId>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a session identifier.
    #[must_use]
    pub fn with_session(session_id: SessionId) -> Self {
        Self {
            state: Arc::new(RwLock::new(Some(session_id))),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> SessionStoreResult<Option<SessionId>> {
        let state = self.state.read().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.clone())
    }

    async fn save(&self, session_id: &SessionId) -> SessionStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        *state = Some(session_id.clone());
        Ok(())
    }

    async fn clear(&self) -> SessionStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            SessionStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        *state = None;
        Ok(())
    }
}
