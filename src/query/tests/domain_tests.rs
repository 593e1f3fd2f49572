//! Domain value tests: session identifiers, state parsing and wire formats.

use crate::query::domain::{
    ContentBlock, DomainEvent, ErrorCause, MessageContent, Notification, OrchestratorState,
    QueryDomainError, RawEvent, SessionId, StreamId, SubmitOutcome,
};
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

#[rstest]
#[case("abc-123", "abc-123")]
#[case("  padded\n", "padded")]
fn session_id_trims_input(#[case] raw: &str, #[case] expected: &str) {
    let session_id = SessionId::new(raw).expect("valid session id");

    assert_eq!(session_id.as_str(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
fn session_id_rejects_blank_values(#[case] raw: &str) {
    assert_eq!(SessionId::new(raw), Err(QueryDomainError::EmptySessionId));
}

#[rstest]
fn session_id_deserialisation_validates() {
    let parsed: Result<SessionId, _> = serde_json::from_value(json!(" "));

    assert!(parsed.is_err());
}

#[rstest]
#[case("idle", OrchestratorState::Idle)]
#[case("RUNNING", OrchestratorState::Running)]
#[case(" running ", OrchestratorState::Running)]
fn state_parses_case_insensitively(#[case] raw: &str, #[case] expected: OrchestratorState) {
    assert_eq!(OrchestratorState::try_from(raw), Ok(expected));
}

#[rstest]
fn state_rejects_unknown_names() {
    let result = OrchestratorState::try_from("paused");

    assert_eq!(
        result.map_err(|err| err.to_string()),
        Err("unknown orchestrator state: paused".to_owned())
    );
}

#[rstest]
fn terminal_events_are_result_and_error() {
    let terminal: Vec<bool> = [
        DomainEvent::text("hi"),
        DomainEvent::ToolUse {
            id: "t1".to_owned(),
            name: "search".to_owned(),
            input: json!({}),
        },
        DomainEvent::ToolResult {
            id: "t1".to_owned(),
            content: json!("ok"),
            is_error: false,
        },
        DomainEvent::result("done"),
        DomainEvent::error(ErrorCause::Timeout, "too slow"),
    ]
    .iter()
    .map(DomainEvent::is_terminal)
    .collect();

    assert_eq!(terminal, [false, false, false, true, true]);
}

#[rstest]
fn notifications_serialise_with_kind_and_payload() {
    let event = Notification::Event(DomainEvent::error(ErrorCause::StreamFault, "pipe closed"));
    let state = Notification::StateChanged(OrchestratorState::Running);

    assert_eq!(
        serde_json::to_value(&event).expect("serialisable"),
        json!({
            "kind": "event",
            "payload": {"type": "error", "message": "pipe closed", "cause": "stream_fault"}
        })
    );
    assert_eq!(
        serde_json::to_value(&state).expect("serialisable"),
        json!({"kind": "state_changed", "payload": "running"})
    );
}

#[rstest]
fn submit_outcome_serialises_stream_identity() {
    let uuid = Uuid::nil();
    let started = SubmitOutcome::Started(StreamId::from_uuid(uuid));

    assert_eq!(
        serde_json::to_value(started).expect("serialisable"),
        json!({"outcome": "started", "stream_id": uuid.to_string()})
    );
    assert_eq!(
        serde_json::to_value(SubmitOutcome::Queued).expect("serialisable"),
        json!({"outcome": "queued"})
    );
}

#[rstest]
fn raw_assistant_event_reads_mixed_blocks() {
    let raw: RawEvent = serde_json::from_value(json!({
        "type": "assistant",
        "message": {
            "id": "msg_1",
            "role": "assistant",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Looking"},
                {"type": "tool_use", "id": "t1", "name": "grep", "input": {"pattern": "fn"}}
            ]
        },
        "session_id": "s-1"
    }))
    .expect("valid assistant event");

    let RawEvent::Assistant(message) = raw else {
        panic!("expected an assistant event");
    };
    assert_eq!(message.session_id.as_deref(), Some("s-1"));
    assert_eq!(
        message.message.content,
        MessageContent::Blocks(vec![
            ContentBlock::Unknown,
            ContentBlock::Text {
                text: "Looking".to_owned()
            },
            ContentBlock::ToolUse {
                id: "t1".to_owned(),
                name: "grep".to_owned(),
                input: json!({"pattern": "fn"}),
            },
        ])
    );
}

#[rstest]
fn raw_result_event_tolerates_extra_fields() {
    let raw: RawEvent = serde_json::from_value(json!({
        "type": "result",
        "subtype": "success",
        "is_error": false,
        "duration_ms": 1200,
        "num_turns": 3,
        "result": "All done",
        "session_id": "s-1",
        "total_cost_usd": 0.01
    }))
    .expect("valid result event");

    let RawEvent::Result(result) = raw else {
        panic!("expected a result event");
    };
    assert_eq!(result.result.as_deref(), Some("All done"));
    assert!(!result.is_error);
}
