//! Domain events published by the orchestrator.

use super::OrchestratorState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classifies why an `error` domain event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCause {
    /// The agent itself reported a failed result.
    AgentFailure,
    /// The adapter failed to start or deliver the stream.
    StreamFault,
    /// The stream exceeded the configured maximum duration.
    Timeout,
}

impl ErrorCause {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgentFailure => "agent_failure",
            Self::StreamFault => "stream_fault",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output contract of the orchestrator.
///
/// Transports receive these in the exact order the underlying raw events
/// arrived.
///
/// # Examples
///
/// ```
/// use gropius::query::domain::DomainEvent;
///
/// let event = DomainEvent::text("hello");
/// let json = serde_json::to_value(&event).expect("event serialises");
/// assert_eq!(json["type"], "text");
/// assert_eq!(json["fragment"], "hello");
/// assert!(!event.is_terminal());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Narration or answer text produced by the agent.
    Text {
        /// The text fragment.
        fragment: String,
    },
    /// The agent requested a tool invocation.
    ToolUse {
        /// Tool call identifier assigned by the agent.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input arguments.
        input: Value,
    },
    /// A tool invocation's result arrived.
    ToolResult {
        /// Identifier of the tool call this result answers.
        id: String,
        /// Opaque result content, interpreted structurally by consumers.
        content: Value,
        /// Whether the tool reported a failure.
        is_error: bool,
    },
    /// The stream completed successfully.
    Result {
        /// Final answer text.
        value: String,
    },
    /// The stream failed or the agent reported failure.
    Error {
        /// Human-readable description.
        message: String,
        /// Failure classification.
        cause: ErrorCause,
    },
}

impl DomainEvent {
    /// Creates a `text` event.
    #[must_use]
    pub fn text(fragment: impl Into<String>) -> Self {
        Self::Text {
            fragment: fragment.into(),
        }
    }

    /// Creates a `result` event.
    #[must_use]
    pub fn result(value: impl Into<String>) -> Self {
        Self::Result {
            value: value.into(),
        }
    }

    /// Creates an `error` event.
    #[must_use]
    pub fn error(cause: ErrorCause, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            cause,
        }
    }

    /// Returns the event kind as used on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolUse { .. } => "tool_use",
            Self::ToolResult { .. } => "tool_result",
            Self::Result { .. } => "result",
            Self::Error { .. } => "error",
        }
    }

    /// Returns `true` for `result` and `error`, which end a stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }
}

/// A notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    /// A domain event from the active stream.
    Event(DomainEvent),
    /// The orchestrator changed state.
    StateChanged(OrchestratorState),
}
