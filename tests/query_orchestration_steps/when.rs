//! When steps for query orchestration BDD scenarios.

use super::world::{OrchestrationWorld, run_async};
use eyre::WrapErr;
use gropius::query::domain::{RawEvent, RestartOptions};
use rstest_bdd_macros::when;

#[when(r#"the user submits "{text}""#)]
fn user_submits(world: &mut OrchestrationWorld, text: String) {
    world.last_submit = Some(run_async(world.orchestrator.submit(text)));
}

#[when("the user interrupts the active stream")]
fn user_interrupts(world: &mut OrchestrationWorld) -> Result<(), eyre::Report> {
    let interrupted = run_async(world.orchestrator.interrupt());
    eyre::ensure!(interrupted, "expected an active stream to interrupt");
    Ok(())
}

#[when(r#"the agent is restarted with kickoff "{kickoff}""#)]
fn agent_restarted(world: &mut OrchestrationWorld, kickoff: String) -> Result<(), eyre::Report> {
    let outcome = run_async(
        world
            .orchestrator
            .restart(RestartOptions::with_kickoff(kickoff)),
    )
    .wrap_err("restart agent")?;
    eyre::ensure!(outcome.is_some(), "expected the kickoff to be submitted");
    Ok(())
}

#[when(r#"the agent finishes stream {index:usize} with result "{value}""#)]
fn agent_finishes_stream(
    world: &mut OrchestrationWorld,
    index: usize,
    value: String,
) -> Result<(), eyre::Report> {
    let handle = world.stream(index)?;
    eyre::ensure!(
        handle.send(RawEvent::success(value)),
        "stream {index} is no longer consumed"
    );
    Ok(())
}

#[when(r#"stream {index:usize} emits text "{text}""#)]
fn stream_emits_text(
    world: &mut OrchestrationWorld,
    index: usize,
    text: String,
) -> Result<(), eyre::Report> {
    // Delivery may fail once the consumer has gone; either way nothing is published.
    world.stream(index)?.send(RawEvent::assistant_text(text));
    Ok(())
}

#[when(r#"stream {index:usize} announces session "{session_id}""#)]
fn stream_announces_session(
    world: &mut OrchestrationWorld,
    index: usize,
    session_id: String,
) -> Result<(), eyre::Report> {
    let handle = world.stream(index)?;
    eyre::ensure!(
        handle.send(RawEvent::session_init(session_id)),
        "stream {index} is no longer consumed"
    );
    Ok(())
}
