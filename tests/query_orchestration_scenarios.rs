//! Behaviour tests for single-flight query orchestration.

#[path = "query_orchestration_steps/mod.rs"]
mod query_orchestration_steps_defs;

use query_orchestration_steps_defs::world::{OrchestrationWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/query_orchestration.feature",
    name = "Submitting before initialisation is rejected"
)]
#[tokio::test(flavor = "multi_thread")]
async fn submit_before_initialise(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/query_orchestration.feature",
    name = "A submission made while busy runs after the active stream"
)]
#[tokio::test(flavor = "multi_thread")]
async fn busy_submission_runs_next(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/query_orchestration.feature",
    name = "Interrupting a running stream drops its late events"
)]
#[tokio::test(flavor = "multi_thread")]
async fn interrupt_drops_late_events(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/query_orchestration.feature",
    name = "Restart discards the stored session"
)]
#[tokio::test(flavor = "multi_thread")]
async fn restart_discards_session(world: OrchestrationWorld) {
    let _ = world;
}
