//! Application services for single-flight query orchestration.

mod broadcast;
mod control;
mod orchestrator;
mod translator;

pub use broadcast::EventBroadcaster;
pub use control::{ControlRequest, ControlResponse, ControlSurface};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorResult, QueryOrchestrator,
};
pub use translator::{Translation, translate};
