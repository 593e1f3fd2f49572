//! Raw events emitted by an agent capability.
//!
//! Raw events follow the stream-JSON protocol used by agent CLIs: a `type`
//! discriminator, an optional `subtype`, and a message body whose content is
//! a list of typed blocks. Unknown event kinds and block kinds deserialize to
//! explicit `Unknown` variants so new agent releases never break a stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event read from an agent stream.
///
/// # Examples
///
/// ```
/// use gropius::query::domain::RawEvent;
///
/// let raw: RawEvent =
///     serde_json::from_str(r#"{"type":"system","subtype":"init","session_id":"abc"}"#)
///         .expect("valid raw event");
/// assert_eq!(raw, RawEvent::session_init("abc"));
///
/// let unknown: RawEvent =
///     serde_json::from_str(r#"{"type":"stream_event","delta":{}}"#).expect("tolerated");
/// assert_eq!(unknown, RawEvent::Unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEvent {
    /// System notification, including session initialisation.
    System(SystemEvent),
    /// Message authored by the agent: text and tool requests.
    Assistant(MessageEvent),
    /// Message fed back to the agent: tool results.
    User(MessageEvent),
    /// Terminal outcome of the stream.
    Result(ResultEvent),
    /// Any event kind this crate does not understand.
    #[serde(other)]
    Unknown,
}

/// Body of a `system` raw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// System event subtype, `init` for session initialisation.
    pub subtype: String,
    /// Session identifier assigned by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Body of an `assistant` or `user` raw event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// The wrapped message.
    pub message: MessagePayload,
    /// Session identifier echoed by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Message wrapper carrying content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Message content, plain text or typed blocks.
    #[serde(default)]
    pub content: MessageContent,
}

/// Message content as sent by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Bare string content.
    Text(String),
    /// Ordered content blocks.
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Blocks(Vec::new())
    }
}

/// One typed block inside message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text segment.
    Text {
        /// Segment text.
        text: String,
    },
    /// Tool invocation request.
    ToolUse {
        /// Tool call identifier.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input arguments.
        #[serde(default)]
        input: Value,
    },
    /// Tool invocation result.
    ToolResult {
        /// Identifier of the answered tool call.
        tool_use_id: String,
        /// Opaque result content.
        #[serde(default)]
        content: Value,
        /// Whether the tool failed.
        #[serde(default)]
        is_error: bool,
    },
    /// Any block kind this crate does not understand (thinking, images, ...).
    #[serde(other)]
    Unknown,
}

/// Body of a `result` raw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEvent {
    /// `success` or an error subtype such as `error_during_execution`.
    pub subtype: String,
    /// Whether the agent flagged the result as an error.
    #[serde(default)]
    pub is_error: bool,
    /// Final answer text, or an error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error details reported alongside an error subtype.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Session identifier echoed by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RawEvent {
    /// Creates a session-initialisation event.
    #[must_use]
    pub fn session_init(session_id: impl Into<String>) -> Self {
        Self::System(SystemEvent {
            subtype: "init".to_owned(),
            session_id: Some(session_id.into()),
        })
    }

    /// Creates an assistant message with the given blocks.
    #[must_use]
    pub const fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self::Assistant(MessageEvent {
            message: MessagePayload {
                content: MessageContent::Blocks(blocks),
            },
            session_id: None,
        })
    }

    /// Creates an assistant message holding a single text block.
    #[must_use]
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::assistant(vec![ContentBlock::Text { text: text.into() }])
    }

    /// Creates an assistant message holding a single tool request.
    #[must_use]
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::assistant(vec![ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }])
    }

    /// Creates a user message holding a single successful tool result.
    #[must_use]
    pub fn tool_result(tool_use_id: impl Into<String>, content: Value) -> Self {
        Self::User(MessageEvent {
            message: MessagePayload {
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: tool_use_id.into(),
                    content,
                    is_error: false,
                }]),
            },
            session_id: None,
        })
    }

    /// Creates a successful terminal result.
    #[must_use]
    pub fn success(result: impl Into<String>) -> Self {
        Self::Result(ResultEvent {
            subtype: "success".to_owned(),
            is_error: false,
            result: Some(result.into()),
            errors: Vec::new(),
            session_id: None,
        })
    }

    /// Creates a failed terminal result with the given subtype and message.
    #[must_use]
    pub fn failure(subtype: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Result(ResultEvent {
            subtype: subtype.into(),
            is_error: true,
            result: None,
            errors: vec![message.into()],
            session_id: None,
        })
    }
}
