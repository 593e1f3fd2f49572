//! Adapter implementations for query orchestration ports.

pub mod cli;
pub mod memory;

mod file_session_store;
mod subscribers;

pub use file_session_store::FileSessionStore;
pub use subscribers::{ChannelSubscriber, JsonLinesSubscriber};
