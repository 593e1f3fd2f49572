//! Given steps for query orchestration BDD scenarios.

use super::world::{OrchestrationWorld, run_async};
use eyre::WrapErr;
use gropius::query::{domain::SessionId, ports::SessionStore};
use rstest_bdd_macros::given;

#[given("an orchestrator that has not been initialised")]
fn uninitialised_orchestrator(world: &mut OrchestrationWorld) {
    world.listen();
}

#[given("an initialised orchestrator")]
fn initialised_orchestrator(world: &mut OrchestrationWorld) -> Result<(), eyre::Report> {
    world.listen();
    run_async(world.orchestrator.initialize()).wrap_err("initialise orchestrator")
}

#[given(r#"a stored session "{session_id}""#)]
fn stored_session(world: &mut OrchestrationWorld, session_id: String) -> Result<(), eyre::Report> {
    let session_id = SessionId::new(session_id).wrap_err("valid session id in scenario")?;
    run_async(world.store.save(&session_id)).wrap_err("seed session store")
}
