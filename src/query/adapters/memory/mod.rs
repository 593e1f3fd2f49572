//! In-memory adapters for deterministic orchestration flows and tests.

mod scripted_agent;
mod session_store;

pub use scripted_agent::{ScriptedAgent, ScriptedStart, ScriptedStreamHandle};
pub use session_store::InMemorySessionStore;
