//! Error types for query domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing query domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryDomainError {
    /// The session identifier is empty after trimming.
    #[error("session identifier must not be empty")]
    EmptySessionId,
}

/// Error returned while parsing orchestrator state from its canonical form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown orchestrator state: {0}")]
pub struct ParseOrchestratorStateError(pub String);
