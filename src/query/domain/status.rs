//! Read-only orchestrator status snapshot.

use super::{OrchestratorState, SessionId};
use serde::{Deserialize, Serialize};

/// Snapshot returned by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Current lifecycle state.
    pub state: OrchestratorState,
    /// Session identifier used to resume the next stream, if any.
    pub session_id: Option<SessionId>,
    /// Milliseconds since the orchestrator was constructed.
    pub uptime_millis: u64,
}
