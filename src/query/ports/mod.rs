//! Port contracts for single-flight query orchestration.

mod agent;
mod session_store;
mod subscriber;

pub use agent::{
    AgentCapability, AgentConnector, AgentError, AgentResult, AgentStream, RawEventStream,
    StreamCanceller,
};
pub use session_store::{SessionStore, SessionStoreError, SessionStoreResult};
pub use subscriber::EventSubscriber;
