//! Single-flight query orchestrator.
//!
//! The orchestrator owns the idle/running state machine, the single queued
//! request slot and the resumable session identifier. It drives an
//! [`AgentCapability`] and publishes translated domain events to
//! subscribers.
//!
//! All mutable state lives behind one async mutex. The consumption loop for
//! the active stream takes that lock once per raw event to check the stream
//! identity, persist a newly announced session identifier and publish the
//! translated events, so those steps never interleave with `submit`,
//! `interrupt` or `restart`.

use super::broadcast::EventBroadcaster;
use super::translator::translate;
use crate::query::{
    domain::{
        DomainEvent, ErrorCause, Notification, OrchestratorState, OrchestratorStatus,
        QueuedRequest, RawEvent, RestartOptions, SessionId, StartOptions, StreamId,
        SubmitOutcome, SubscriptionId,
    },
    ports::{
        AgentCapability, AgentConnector, AgentError, EventSubscriber, RawEventStream,
        SessionStore, StreamCanceller,
    },
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::future::BoxFuture;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Runtime tuning for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Longest a publish waits on one subscriber's full queue.
    pub publish_timeout: Duration,
    /// Per-subscriber notification queue size.
    pub subscriber_buffer: usize,
    /// Optional cap on a single stream's duration.
    pub max_stream_duration: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            max_stream_duration: None,
        }
    }
}

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The agent capability could not be constructed.
    #[error("agent capability could not be initialised: {0}")]
    Initialization(#[source] AgentError),

    /// An operation that needs the agent ran before `initialize` succeeded.
    #[error("orchestrator has not been initialised")]
    NotInitialized,

    /// The agent capability rejected a configuration reload.
    #[error("agent configuration reload failed: {0}")]
    ConfigReload(#[source] AgentError),
}

impl OrchestratorError {
    /// Returns `true` for the fatal initialisation family of errors.
    #[must_use]
    pub const fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization(_) | Self::NotInitialized)
    }
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Single-flight orchestrator over an agent capability.
///
/// Cloning yields another handle to the same orchestrator.
pub struct QueryOrchestrator<K, S, C>
where
    K: AgentConnector + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    inner: Arc<Inner<K, S, C>>,
}

impl<K, S, C> Clone for QueryOrchestrator<K, S, C>
where
    K: AgentConnector + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<K, S, C>
where
    K: AgentConnector,
{
    connector: Arc<K>,
    store: Arc<S>,
    clock: Arc<C>,
    config: OrchestratorConfig,
    broadcaster: EventBroadcaster,
    started_at: DateTime<Utc>,
    core: Mutex<Core<K::Agent>>,
}

struct Core<A> {
    agent: Option<Arc<A>>,
    activity: Activity,
    queued: Option<QueuedRequest>,
    session_id: Option<SessionId>,
}

enum Activity {
    Idle,
    Running(ActiveStream),
}

struct ActiveStream {
    id: StreamId,
    token: CancellationToken,
    canceller: Arc<dyn StreamCanceller>,
}

impl<A> Core<A> {
    const fn state(&self) -> OrchestratorState {
        match self.activity {
            Activity::Idle => OrchestratorState::Idle,
            Activity::Running(_) => OrchestratorState::Running,
        }
    }

    fn is_active(&self, id: StreamId) -> bool {
        matches!(&self.activity, Activity::Running(active) if active.id == id)
    }

    fn agent(&self) -> OrchestratorResult<Arc<A>> {
        self.agent.clone().ok_or(OrchestratorError::NotInitialized)
    }
}

impl<K, S, C> QueryOrchestrator<K, S, C>
where
    K: AgentConnector + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an orchestrator in the `Idle` state.
    ///
    /// No agent is connected and no session is loaded until
    /// [`Self::initialize`] succeeds.
    #[must_use]
    pub fn new(
        connector: Arc<K>,
        store: Arc<S>,
        clock: Arc<C>,
        config: OrchestratorConfig,
    ) -> Self {
        let broadcaster = EventBroadcaster::new(config.subscriber_buffer, config.publish_timeout);
        let started_at = clock.utc();
        Self {
            inner: Arc::new(Inner {
                connector,
                store,
                clock,
                config,
                broadcaster,
                started_at,
                core: Mutex::new(Core {
                    agent: None,
                    activity: Activity::Idle,
                    queued: None,
                    session_id: None,
                }),
            }),
        }
    }

    /// Loads the stored session identifier and connects the agent.
    ///
    /// A store read failure is logged and treated as "no prior session".
    /// Calling this again after success has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Initialization`] when the agent capability
    /// cannot be constructed.
    pub async fn initialize(&self) -> OrchestratorResult<()> {
        let mut core = self.inner.core.lock().await;
        if core.agent.is_some() {
            return Ok(());
        }

        let session_id = match self.inner.store.load().await {
            Ok(session_id) => session_id,
            Err(err) => {
                warn!(error = %err, "stored session could not be loaded; starting fresh");
                None
            }
        };
        let agent = self
            .inner
            .connector
            .connect()
            .await
            .map_err(OrchestratorError::Initialization)?;

        info!(
            resumable = session_id.is_some(),
            "query orchestrator initialised"
        );
        core.session_id = session_id;
        core.agent = Some(Arc::new(agent));
        Ok(())
    }

    /// Submits a prompt.
    ///
    /// When idle, a stream starts and this returns once it is established;
    /// results arrive as published events. When a stream is active, the
    /// prompt replaces any queued request and is dispatched when the active
    /// stream ends.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotInitialized`] before a successful
    /// [`Self::initialize`].
    pub async fn submit(&self, text: impl Into<String>) -> OrchestratorResult<SubmitOutcome> {
        let text = text.into();
        let mut core = self.inner.core.lock().await;
        let agent = core.agent()?;

        if core.state().is_running() {
            if core.queued.replace(QueuedRequest::new(text)).is_some() {
                debug!("queued request displaced by a newer submission");
            }
            return Ok(SubmitOutcome::Queued);
        }

        Ok(self.inner.dispatch(&mut core, &agent, text).await)
    }

    /// Cancels the active stream and returns to `Idle`.
    ///
    /// Returns `false` without side effects when already idle. A queued
    /// request survives the interruption and is dispatched right after the
    /// `Idle` notification.
    pub async fn interrupt(&self) -> bool {
        let mut core = self.inner.core.lock().await;
        let stopped = self.inner.stop_active(&mut core).await;
        if stopped {
            info!("agent stream interrupted");
            self.inner.dispatch_queued(&mut core).await;
        }
        stopped
    }

    /// Drops the queued request and stops the active stream without
    /// dispatching anything further. The stored session is kept.
    pub async fn shutdown(&self) {
        let mut core = self.inner.core.lock().await;
        core.queued = None;
        if self.inner.stop_active(&mut core).await {
            info!("agent stream stopped for shutdown");
        }
    }

    /// Discards the conversation and resets the agent.
    ///
    /// Interrupts the active stream, clears the queued request and the stored
    /// session, reloads the agent configuration and, when a kickoff prompt is
    /// given, submits it. Returns the kickoff's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotInitialized`] before a successful
    /// [`Self::initialize`], or [`OrchestratorError::ConfigReload`] when the
    /// agent rejects the reload; the reset itself has happened by then and
    /// the kickoff is not submitted.
    pub async fn restart(
        &self,
        options: RestartOptions,
    ) -> OrchestratorResult<Option<SubmitOutcome>> {
        let mut core = self.inner.core.lock().await;
        let agent = core.agent()?;

        self.inner.stop_active(&mut core).await;
        core.queued = None;
        core.session_id = None;
        if let Err(err) = self.inner.store.clear().await {
            warn!(error = %err, "stored session could not be cleared");
        }
        agent
            .reload_config()
            .await
            .map_err(OrchestratorError::ConfigReload)?;
        info!(kickoff = options.kickoff.is_some(), "agent restarted");

        match options.kickoff {
            Some(kickoff) => Ok(Some(self.inner.dispatch(&mut core, &agent, kickoff).await)),
            None => Ok(None),
        }
    }

    /// Reloads the agent's capability registry without touching state.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotInitialized`] before a successful
    /// [`Self::initialize`], or [`OrchestratorError::ConfigReload`] when the
    /// agent rejects the reload.
    pub async fn reload_config(&self) -> OrchestratorResult<()> {
        let agent = self.inner.core.lock().await.agent()?;
        agent
            .reload_config()
            .await
            .map_err(OrchestratorError::ConfigReload)?;
        info!("agent configuration reloaded");
        Ok(())
    }

    /// Returns the current state, session and uptime.
    pub async fn status(&self) -> OrchestratorStatus {
        let core = self.inner.core.lock().await;
        let elapsed = self.inner.clock.utc() - self.inner.started_at;
        OrchestratorStatus {
            state: core.state(),
            session_id: core.session_id.clone(),
            uptime_millis: u64::try_from(elapsed.num_milliseconds()).unwrap_or(0),
        }
    }

    /// Returns the current state.
    pub async fn state(&self) -> OrchestratorState {
        self.inner.core.lock().await.state()
    }

    /// Returns the request waiting for the active stream to end, if any.
    pub async fn queued_request(&self) -> Option<QueuedRequest> {
        self.inner.core.lock().await.queued.clone()
    }

    /// Registers a subscriber for domain events and state changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        self.inner.broadcaster.subscribe(subscriber)
    }

    /// Removes a subscriber. Returns `false` when the token is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.broadcaster.unsubscribe(id)
    }
}

impl<K, S, C> Inner<K, S, C>
where
    K: AgentConnector + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Starts a stream for `prompt`. When the agent refuses to start, the
    /// fault is published and the queued request, if any, is tried next.
    async fn dispatch(
        self: &Arc<Self>,
        core: &mut Core<K::Agent>,
        agent: &Arc<K::Agent>,
        prompt: String,
    ) -> SubmitOutcome {
        let mut prompt = prompt;
        let mut first_outcome = None;
        loop {
            let outcome = self.start_stream(core, agent, &prompt).await;
            let first = *first_outcome.get_or_insert(outcome);
            if matches!(outcome, SubmitOutcome::Started(_)) {
                return first;
            }
            match core.queued.take() {
                Some(next) => prompt = next.text,
                None => return first,
            }
        }
    }

    async fn start_stream(
        self: &Arc<Self>,
        core: &mut Core<K::Agent>,
        agent: &Arc<K::Agent>,
        prompt: &str,
    ) -> SubmitOutcome {
        let options = StartOptions::new(core.session_id.clone());
        match agent.start(prompt, &options).await {
            Ok(stream) => {
                let (events, canceller) = stream.into_parts();
                let id = StreamId::new();
                let token = CancellationToken::new();
                core.activity = Activity::Running(ActiveStream {
                    id,
                    token: token.clone(),
                    canceller,
                });
                info!(
                    stream_id = %id,
                    resume = options.session_id.is_some(),
                    "agent stream started"
                );
                self.broadcaster
                    .publish(Notification::StateChanged(OrchestratorState::Running))
                    .await;
                tokio::spawn(Arc::clone(self).consume(id, events, token));
                SubmitOutcome::Started(id)
            }
            Err(err) => {
                error!(error = %err, "agent stream could not be started");
                self.broadcaster
                    .publish(Notification::Event(DomainEvent::error(
                        ErrorCause::StreamFault,
                        err.to_string(),
                    )))
                    .await;
                SubmitOutcome::Faulted
            }
        }
    }

    /// Consumption loop for one stream. Boxed so that the loop, which may
    /// dispatch the queued request and spawn the next loop, has a nameable
    /// `Send` type.
    fn consume(
        self: Arc<Self>,
        id: StreamId,
        mut events: RawEventStream,
        token: CancellationToken,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let deadline = self
                .config
                .max_stream_duration
                .map(|limit| Instant::now() + limit);
            loop {
                let next = tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    () = wait_until(deadline) => {
                        self.expire(id).await;
                        return;
                    }
                    next = events.next() => next,
                };

                let mut core = self.core.lock().await;
                if !core.is_active(id) {
                    debug!(stream_id = %id, "dropping event from a stream that is no longer active");
                    return;
                }
                let terminal = match next {
                    Some(Ok(raw)) => self.apply(&mut core, &raw).await,
                    Some(Err(err)) => {
                        self.publish_fault(id, err.to_string()).await;
                        true
                    }
                    None => {
                        self.publish_fault(id, "agent stream ended without a result".to_owned())
                            .await;
                        true
                    }
                };
                if terminal {
                    self.finish(&mut core).await;
                    return;
                }
            }
        })
    }

    /// Persists any announced session and publishes the translated events.
    /// Returns `true` when the event ended the stream.
    async fn apply(&self, core: &mut Core<K::Agent>, raw: &RawEvent) -> bool {
        let translation = translate(raw);
        if let Some(session_id) = translation.session_id {
            self.record_session(core, session_id).await;
        }

        let mut terminal = false;
        for event in translation.events {
            if let DomainEvent::Error { message, .. } = &event {
                warn!(error = %message, "agent reported a failure");
            }
            terminal |= event.is_terminal();
            self.broadcaster.publish(Notification::Event(event)).await;
        }
        terminal
    }

    async fn record_session(&self, core: &mut Core<K::Agent>, session_id: SessionId) {
        if core.session_id.as_ref() == Some(&session_id) {
            return;
        }
        match self.store.save(&session_id).await {
            Ok(()) => info!(session_id = %session_id, "agent session recorded"),
            Err(err) => warn!(
                session_id = %session_id,
                error = %err,
                "agent session could not be persisted"
            ),
        }
        core.session_id = Some(session_id);
    }

    async fn publish_fault(&self, id: StreamId, message: String) {
        error!(stream_id = %id, error = %message, "agent stream fault");
        self.broadcaster
            .publish(Notification::Event(DomainEvent::error(
                ErrorCause::StreamFault,
                message,
            )))
            .await;
    }

    /// Returns to `Idle` after a terminal event and dispatches the queued
    /// request before the lock is released.
    async fn finish(self: &Arc<Self>, core: &mut Core<K::Agent>) {
        core.activity = Activity::Idle;
        info!("agent stream finished");
        self.broadcaster
            .publish(Notification::StateChanged(OrchestratorState::Idle))
            .await;
        self.dispatch_queued(core).await;
    }

    async fn expire(self: &Arc<Self>, id: StreamId) {
        let mut core = self.core.lock().await;
        if !core.is_active(id) {
            return;
        }
        warn!(stream_id = %id, "agent stream exceeded its maximum duration");
        self.stop_active(&mut core).await;
        self.broadcaster
            .publish(Notification::Event(DomainEvent::error(
                ErrorCause::Timeout,
                "agent stream exceeded its maximum duration",
            )))
            .await;
        self.dispatch_queued(&mut core).await;
    }

    async fn dispatch_queued(self: &Arc<Self>, core: &mut Core<K::Agent>) {
        let Some(next) = core.queued.take() else {
            return;
        };
        let Some(agent) = core.agent.clone() else {
            return;
        };
        debug!("dispatching queued request");
        self.dispatch(core, &agent, next.text).await;
    }

    /// Cancels the active stream, if any, and forces `Idle`.
    async fn stop_active(&self, core: &mut Core<K::Agent>) -> bool {
        let Activity::Running(active) = std::mem::replace(&mut core.activity, Activity::Idle)
        else {
            return false;
        };
        active.token.cancel();
        if let Err(err) = active.canceller.cancel().await {
            warn!(stream_id = %active.id, error = %err, "agent stream cancellation failed");
        }
        self.broadcaster
            .publish(Notification::StateChanged(OrchestratorState::Idle))
            .await;
        true
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
