//! Request-side value types: queued submissions, start and restart options.

use super::{SessionId, StreamId};
use serde::{Deserialize, Serialize};

/// Single-slot buffer entry for a submission made while a stream is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Prompt text to dispatch once the orchestrator is idle.
    pub text: String,
}

impl QueuedRequest {
    /// Creates a queued request.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Options passed to the agent capability when a stream starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOptions {
    /// Session to resume; `None` starts a fresh conversation.
    pub session_id: Option<SessionId>,
    /// Tool approval policy. Always `true`: every tool call is approved.
    pub auto_approve_tools: bool,
}

impl StartOptions {
    /// Creates start options with the fixed auto-approve policy.
    #[must_use]
    pub const fn new(session_id: Option<SessionId>) -> Self {
        Self {
            session_id,
            auto_approve_tools: true,
        }
    }
}

/// Options accepted by the restart operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartOptions {
    /// Prompt submitted immediately after the reset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickoff: Option<String>,
}

impl RestartOptions {
    /// Creates restart options with a kickoff prompt.
    #[must_use]
    pub fn with_kickoff(kickoff: impl Into<String>) -> Self {
        Self {
            kickoff: Some(kickoff.into()),
        }
    }
}

/// What happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "stream_id", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// A new stream was established for the submission.
    Started(StreamId),
    /// A stream is active; the submission replaced the queued request.
    Queued,
    /// The agent stream could not be established; an `error` event was
    /// published instead.
    Faulted,
}
