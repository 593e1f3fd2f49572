//! Translation of raw agent events into domain events.

use crate::query::domain::{
    ContentBlock, DomainEvent, ErrorCause, MessageContent, MessageEvent, RawEvent, ResultEvent,
    SessionId, SystemEvent,
};
use tracing::debug;

const INIT_SUBTYPE: &str = "init";
const SUCCESS_SUBTYPE: &str = "success";

/// Outcome of translating one raw event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    /// Session identifier announced by a session-initialisation event.
    pub session_id: Option<SessionId>,
    /// Domain events in emission order.
    pub events: Vec<DomainEvent>,
}

impl Translation {
    fn events(events: Vec<DomainEvent>) -> Self {
        Self {
            session_id: None,
            events,
        }
    }

    /// Returns `true` when one of the events ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.events.iter().any(DomainEvent::is_terminal)
    }
}

/// Maps one raw event into zero or more domain events.
///
/// Unknown event kinds, unknown block kinds and unknown system subtypes
/// yield an empty translation.
///
/// # Examples
///
/// ```
/// use gropius::query::domain::{DomainEvent, RawEvent};
/// use gropius::query::services::translate;
///
/// let translation = translate(&RawEvent::assistant_text("Working on it"));
/// assert_eq!(translation.events, vec![DomainEvent::text("Working on it")]);
/// assert!(translate(&RawEvent::Unknown).events.is_empty());
/// ```
#[must_use]
pub fn translate(raw: &RawEvent) -> Translation {
    match raw {
        RawEvent::System(system) => translate_system(system),
        RawEvent::Assistant(message) => Translation::events(translate_message(message)),
        RawEvent::User(message) => Translation::events(translate_tool_results(message)),
        RawEvent::Result(result) => Translation::events(vec![translate_result(result)]),
        RawEvent::Unknown => {
            debug!("ignoring unrecognised raw agent event");
            Translation::default()
        }
    }
}

fn translate_system(system: &SystemEvent) -> Translation {
    if system.subtype != INIT_SUBTYPE {
        return Translation::default();
    }
    let session_id = system
        .session_id
        .as_deref()
        .and_then(|raw| SessionId::new(raw).ok());
    Translation {
        session_id,
        events: Vec::new(),
    }
}

fn translate_message(message: &MessageEvent) -> Vec<DomainEvent> {
    match &message.message.content {
        MessageContent::Text(text) if text.is_empty() => Vec::new(),
        MessageContent::Text(text) => vec![DomainEvent::text(text.clone())],
        MessageContent::Blocks(blocks) => blocks.iter().filter_map(translate_block).collect(),
    }
}

/// User messages only carry tool results back to the agent. Their text is
/// the user's own (echoed prompts, interruption markers) and is not narration.
fn translate_tool_results(message: &MessageEvent) -> Vec<DomainEvent> {
    match &message.message.content {
        MessageContent::Text(_) => Vec::new(),
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter(|block| matches!(block, ContentBlock::ToolResult { .. }))
            .filter_map(translate_block)
            .collect(),
    }
}

fn translate_block(block: &ContentBlock) -> Option<DomainEvent> {
    match block {
        ContentBlock::Text { text } if text.is_empty() => None,
        ContentBlock::Text { text } => Some(DomainEvent::text(text.clone())),
        ContentBlock::ToolUse { id, name, input } => Some(DomainEvent::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => Some(DomainEvent::ToolResult {
            id: tool_use_id.clone(),
            content: content.clone(),
            is_error: *is_error,
        }),
        ContentBlock::Unknown => None,
    }
}

fn translate_result(result: &ResultEvent) -> DomainEvent {
    if result.subtype == SUCCESS_SUBTYPE && !result.is_error {
        return DomainEvent::result(result.result.clone().unwrap_or_default());
    }
    DomainEvent::error(ErrorCause::AgentFailure, failure_message(result))
}

fn failure_message(result: &ResultEvent) -> String {
    if let Some(text) = result.result.as_deref().filter(|text| !text.trim().is_empty()) {
        return text.to_owned();
    }
    if !result.errors.is_empty() {
        return result.errors.join("; ");
    }
    format!("agent reported {}", result.subtype)
}
