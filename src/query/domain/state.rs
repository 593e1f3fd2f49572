//! Orchestrator lifecycle state.

use super::ParseOrchestratorStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the query orchestrator.
///
/// `Running` holds exactly when one agent stream is active; `Idle` holds when
/// none is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    /// No agent stream is active.
    #[default]
    Idle,
    /// One agent stream is being consumed.
    Running,
}

impl OrchestratorState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }

    /// Returns `true` when a stream is active.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OrchestratorState {
    type Error = ParseOrchestratorStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            _ => Err(ParseOrchestratorStateError(value.to_owned())),
        }
    }
}
