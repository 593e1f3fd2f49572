//! Agent capability port.
//!
//! An agent capability turns a prompt into a cancellable stream of raw
//! events. Construction goes through [`AgentConnector`] so that missing
//! binaries or credentials surface once, at initialisation.

use crate::query::domain::{RawEvent, StartOptions};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for agent capability operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Stream of raw events produced by one agent invocation.
pub type RawEventStream = BoxStream<'static, AgentResult<RawEvent>>;

/// Builds an agent capability.
#[async_trait]
pub trait AgentConnector: Send + Sync {
    /// Capability produced by a successful connection.
    type Agent: AgentCapability + 'static;

    /// Constructs the capability.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the capability cannot be constructed, for
    /// example because the agent program or its credentials are missing.
    async fn connect(&self) -> AgentResult<Self::Agent>;
}

/// Streaming agent invocation contract.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// Starts one agent invocation.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the invocation cannot be established.
    async fn start(&self, prompt: &str, options: &StartOptions) -> AgentResult<AgentStream>;

    /// Reloads the capability registry (tool and server configuration).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] when the registry cannot be read
    /// or validated.
    async fn reload_config(&self) -> AgentResult<()>;
}

/// Stops event delivery for one stream.
#[async_trait]
pub trait StreamCanceller: Send + Sync {
    /// Requests cancellation. Delivery stops within bounded time.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the underlying invocation could not be
    /// stopped.
    async fn cancel(&self) -> AgentResult<()>;
}

/// One established agent invocation: its events and a way to stop them.
pub struct AgentStream {
    events: RawEventStream,
    canceller: Arc<dyn StreamCanceller>,
}

impl AgentStream {
    /// Pairs an event stream with its canceller.
    #[must_use]
    pub fn new(events: RawEventStream, canceller: Arc<dyn StreamCanceller>) -> Self {
        Self { events, canceller }
    }

    /// Splits the stream into its events and canceller.
    #[must_use]
    pub fn into_parts(self) -> (RawEventStream, Arc<dyn StreamCanceller>) {
        (self.events, self.canceller)
    }
}

impl fmt::Debug for AgentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentStream").finish_non_exhaustive()
    }
}

/// Errors returned by agent capability adapters.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The agent program could not be located.
    #[error("agent program not found: {0}")]
    ProgramNotFound(String),

    /// A required credential is not configured.
    #[error("agent credential is not configured: {0}")]
    MissingCredential(String),

    /// The capability registry is unreadable or invalid.
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),

    /// The agent produced output that violates the stream protocol.
    #[error("agent protocol error: {0}")]
    Protocol(String),

    /// Generic runtime failure.
    #[error("agent runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentError {
    /// Wraps a runtime error from the adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
