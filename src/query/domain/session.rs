//! Resumable agent session handle.

use super::QueryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session identifier assigned by the agent capability.
///
/// The orchestrator passes it back on the next stream start so the agent can
/// resume conversational context.
///
/// # Examples
///
/// ```
/// use gropius::query::domain::SessionId;
///
/// let session = SessionId::new("  3f2a-session  ").expect("valid session id");
/// assert_eq!(session.as_str(), "3f2a-session");
/// assert!(SessionId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Creates a validated session identifier.
    ///
    /// # Errors
    ///
    /// Returns [`QueryDomainError::EmptySessionId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, QueryDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryDomainError::EmptySessionId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = QueryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
