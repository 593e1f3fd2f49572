//! Domain model for single-flight query orchestration.
//!
//! The query domain models orchestrator state, the resumable session handle,
//! the raw events produced by an agent capability and the fixed set of
//! domain events the orchestrator publishes. Infrastructure concerns remain
//! outside this boundary.

mod error;
mod event;
mod ids;
mod raw_event;
mod request;
mod session;
mod state;
mod status;

pub use error::{ParseOrchestratorStateError, QueryDomainError};
pub use event::{DomainEvent, ErrorCause, Notification};
pub use ids::{StreamId, SubscriptionId};
pub use raw_event::{
    ContentBlock, MessageContent, MessageEvent, MessagePayload, RawEvent, ResultEvent,
    SystemEvent,
};
pub use request::{QueuedRequest, RestartOptions, StartOptions, SubmitOutcome};
pub use session::SessionId;
pub use state::OrchestratorState;
pub use status::OrchestratorStatus;
