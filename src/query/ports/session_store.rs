//! Port for durable session identifier storage.
//!
//! The store holds exactly one value: the most recently observed session
//! identifier. Absence means there is no prior session to resume.

use crate::query::domain::SessionId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for session store operations.
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Persistence contract for the resumable session identifier.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - `load` returns `Ok(None)` when nothing has been stored
/// - `save` is last-write-wins and durable before it returns
/// - `clear` succeeds when nothing is stored
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the stored session identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when the medium cannot be read or the
    /// stored value is invalid.
    async fn load(&self) -> SessionStoreResult<Option<SessionId>>;

    /// Replaces the stored session identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Persistence`] when the write cannot be
    /// made durable.
    async fn save(&self, session_id: &SessionId) -> SessionStoreResult<()>;

    /// Removes the stored session identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Persistence`] when the record exists but
    /// cannot be removed.
    async fn clear(&self) -> SessionStoreResult<()>;
}

/// Errors returned by session store implementations.
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// Stored data could not be reconstructed into a session identifier.
    #[error("invalid persisted session data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Storage-medium failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionStoreError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a storage-medium failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
