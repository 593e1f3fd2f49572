//! Then steps for query orchestration BDD scenarios.

use super::world::{OrchestrationWorld, run_async};
use eyre::WrapErr;
use gropius::query::{
    domain::{OrchestratorState, SessionId, SubmitOutcome},
    ports::SessionStore,
};
use rstest_bdd_macros::then;

#[then("the submission fails with an initialisation error")]
fn submission_fails_with_initialisation_error(
    world: &OrchestrationWorld,
) -> Result<(), eyre::Report> {
    let result = world
        .last_submit
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submit result"))?;
    match result {
        Err(err) if err.is_initialization() => Ok(()),
        other => Err(eyre::eyre!("expected an initialisation error, got {other:?}")),
    }
}

#[then("the submission is queued")]
fn submission_is_queued(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_submit
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submit result"))?;
    eyre::ensure!(
        matches!(result, Ok(SubmitOutcome::Queued)),
        "expected a queued submission, got {result:?}"
    );
    Ok(())
}

#[then("no agent stream was started")]
fn no_stream_started(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let starts = world.agent.starts();
    eyre::ensure!(starts.is_empty(), "unexpected stream starts: {starts:?}");
    Ok(())
}

#[then("the orchestrator is idle")]
fn orchestrator_is_idle(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let state = run_async(world.orchestrator.state());
    eyre::ensure!(
        state == OrchestratorState::Idle,
        "expected idle, found {state}"
    );
    Ok(())
}

#[then(r#"stream {index:usize} was started with prompt "{prompt}""#)]
fn stream_started_with_prompt(
    world: &OrchestrationWorld,
    index: usize,
    prompt: String,
) -> Result<(), eyre::Report> {
    run_async(world.wait_for_starts(index))?;
    let starts = world.agent.starts();
    let start = index
        .checked_sub(1)
        .and_then(|position| starts.get(position))
        .ok_or_else(|| eyre::eyre!("stream {index} has not been started"))?;
    eyre::ensure!(
        start.prompt == prompt,
        "expected prompt {prompt:?}, found {:?}",
        start.prompt
    );
    Ok(())
}

#[then(r#"stream {index:usize} was started without a resume session"#)]
fn stream_started_fresh(world: &OrchestrationWorld, index: usize) -> Result<(), eyre::Report> {
    run_async(world.wait_for_starts(index))?;
    let starts = world.agent.starts();
    let start = index
        .checked_sub(1)
        .and_then(|position| starts.get(position))
        .ok_or_else(|| eyre::eyre!("stream {index} has not been started"))?;
    eyre::ensure!(
        start.options.session_id.is_none(),
        "expected a fresh stream, found session {:?}",
        start.options.session_id
    );
    Ok(())
}

#[then(r#"the observed notifications are "{sequence}""#)]
fn observed_notifications(
    world: &mut OrchestrationWorld,
    sequence: String,
) -> Result<(), eyre::Report> {
    let expected: Vec<&str> = sequence.split(',').map(str::trim).collect();
    let observed = run_async(world.observe(expected.len()))?;
    eyre::ensure!(
        observed == expected.as_slice(),
        "expected {expected:?}, observed {observed:?}"
    );
    Ok(())
}

#[then("no session is stored")]
fn no_session_stored(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let stored = run_async(world.store.load()).wrap_err("load stored session")?;
    eyre::ensure!(stored.is_none(), "unexpected stored session {stored:?}");
    Ok(())
}

#[then(r#"the stored session is "{session_id}""#)]
fn stored_session_is(world: &OrchestrationWorld, session_id: String) -> Result<(), eyre::Report> {
    let expected = SessionId::new(session_id).wrap_err("valid session id in scenario")?;
    let stored = run_async(world.store.load()).wrap_err("load stored session")?;
    eyre::ensure!(
        stored.as_ref() == Some(&expected),
        "expected stored session {expected}, found {stored:?}"
    );
    Ok(())
}
