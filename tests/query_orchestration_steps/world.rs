//! Shared world state for query orchestration BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use gropius::query::{
    adapters::{
        ChannelSubscriber,
        memory::{InMemorySessionStore, ScriptedAgent, ScriptedStreamHandle},
    },
    domain::{DomainEvent, Notification, OrchestratorState, SubmitOutcome},
    services::{OrchestratorConfig, OrchestratorResult, QueryOrchestrator},
};
use mockable::DefaultClock;
use rstest::fixture;
use tokio::sync::mpsc::UnboundedReceiver;

/// Orchestrator type used by the BDD world.
pub type TestOrchestrator = QueryOrchestrator<ScriptedAgent, InMemorySessionStore, DefaultClock>;

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(150);
const POLL: Duration = Duration::from_millis(10);

/// Scenario world for orchestration behaviour tests.
pub struct OrchestrationWorld {
    pub agent: ScriptedAgent,
    pub store: InMemorySessionStore,
    pub orchestrator: TestOrchestrator,
    pub notifications: Option<UnboundedReceiver<Notification>>,
    pub observed: Vec<String>,
    pub last_submit: Option<OrchestratorResult<SubmitOutcome>>,
}

impl OrchestrationWorld {
    /// Creates a world whose orchestrator shares the scripted agent and
    /// store with the world.
    #[must_use]
    pub fn new() -> Self {
        let agent = ScriptedAgent::new();
        let store = InMemorySessionStore::new();
        let orchestrator = QueryOrchestrator::new(
            Arc::new(agent.clone()),
            Arc::new(store.clone()),
            Arc::new(DefaultClock),
            OrchestratorConfig::default(),
        );

        Self {
            agent,
            store,
            orchestrator,
            notifications: None,
            observed: Vec::new(),
            last_submit: None,
        }
    }

    /// Registers the world's subscriber. Must run inside the runtime.
    pub fn listen(&mut self) {
        let (subscriber, receiver) = ChannelSubscriber::new();
        self.orchestrator.subscribe(Arc::new(subscriber));
        self.notifications = Some(receiver);
    }

    /// Returns the handle of the 1-based `index`-th stream.
    pub fn stream(&self, index: usize) -> Result<ScriptedStreamHandle, eyre::Report> {
        index
            .checked_sub(1)
            .and_then(|position| self.agent.stream(position))
            .ok_or_else(|| eyre::eyre!("stream {index} has not been started"))
    }

    /// Waits until at least `count` streams have been started.
    pub async fn wait_for_starts(&self, count: usize) -> Result<(), eyre::Report> {
        tokio::time::timeout(WAIT, async {
            while self.agent.starts().len() < count {
                tokio::time::sleep(POLL).await;
            }
        })
        .await
        .map_err(|_| eyre::eyre!("expected {count} stream starts"))
    }

    /// Drains notifications until `count` have been observed and the
    /// subscriber stays quiet.
    pub async fn observe(&mut self, count: usize) -> Result<&[String], eyre::Report> {
        let receiver = self
            .notifications
            .as_mut()
            .ok_or_else(|| eyre::eyre!("no subscriber registered"))?;
        while self.observed.len() < count {
            let notification = tokio::time::timeout(WAIT, receiver.recv())
                .await
                .map_err(|_| eyre::eyre!("timed out after {:?}", self.observed))?
                .ok_or_else(|| eyre::eyre!("notification channel closed"))?;
            self.observed.push(describe(&notification));
        }
        while let Ok(Some(extra)) = tokio::time::timeout(QUIET, receiver.recv()).await {
            self.observed.push(describe(&extra));
        }
        Ok(&self.observed)
    }
}

impl Default for OrchestrationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact textual form used by the feature files.
fn describe(notification: &Notification) -> String {
    match notification {
        Notification::StateChanged(OrchestratorState::Idle) => "idle".to_owned(),
        Notification::StateChanged(OrchestratorState::Running) => "running".to_owned(),
        Notification::Event(DomainEvent::Text { fragment }) => format!("text:{fragment}"),
        Notification::Event(DomainEvent::Result { value }) => format!("result:{value}"),
        Notification::Event(DomainEvent::Error { cause, .. }) => format!("error:{cause}"),
        Notification::Event(other) => other.kind().to_owned(),
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrchestrationWorld {
    OrchestrationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
