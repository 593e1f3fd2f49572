//! Scripted in-process agent capability.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::query::{
    domain::{RawEvent, StartOptions},
    ports::{
        AgentCapability, AgentConnector, AgentError, AgentResult, AgentStream, StreamCanceller,
    },
};

/// Deterministic agent capability driven by the caller.
///
/// Every `start` records the prompt and options, opens a stream preloaded
/// with the next queued script (if any) and hands out a
/// [`ScriptedStreamHandle`] for pushing further events. Cancelling a stream
/// only marks it cancelled; the handle can still push events, which models a
/// backend that keeps emitting after it was told to stop.
///
/// Clones share state, and the agent is its own [`AgentConnector`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    state: Arc<Mutex<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    scripts: VecDeque<Vec<RawEvent>>,
    starts: Vec<ScriptedStart>,
    streams: Vec<ScriptedStreamHandle>,
    connect_error: Option<String>,
    start_errors: VecDeque<String>,
    cancel_error: Option<String>,
    reload_error: Option<String>,
    reloads: usize,
}

/// One recorded `start` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedStart {
    /// Prompt passed to the agent.
    pub prompt: String,
    /// Options passed to the agent.
    pub options: StartOptions,
}

/// Caller-side control over one scripted stream.
#[derive(Debug, Clone)]
pub struct ScriptedStreamHandle {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<AgentResult<RawEvent>>>>>,
    cancelled: Arc<AtomicBool>,
}

impl ScriptedStreamHandle {
    fn deliver(&self, item: AgentResult<RawEvent>) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| sender.send(item).is_ok())
    }

    /// Pushes a raw event. Returns `false` once the stream is closed or its
    /// consumer has gone.
    pub fn send(&self, event: RawEvent) -> bool {
        self.deliver(Ok(event))
    }

    /// Pushes a stream-level failure.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.deliver(Err(AgentError::Protocol(message.into())))
    }

    /// Ends the stream without further events.
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Returns `true` once the orchestrator has cancelled the stream.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct ScriptedCanceller {
    cancelled: Arc<AtomicBool>,
    error: Option<String>,
}

#[async_trait]
impl StreamCanceller for ScriptedCanceller {
    async fn cancel(&self) -> AgentResult<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        match &self.error {
            Some(message) => Err(AgentError::runtime(std::io::Error::other(message.clone()))),
            None => Ok(()),
        }
    }
}

impl ScriptedAgent {
    /// Creates an agent with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the events preloaded into the next started stream.
    pub fn push_script(&self, events: Vec<RawEvent>) {
        self.state().scripts.push_back(events);
    }

    /// Makes `connect` fail with the given message.
    pub fn fail_connect(&self, message: impl Into<String>) {
        self.state().connect_error = Some(message.into());
    }

    /// Makes the next `start` fail with the given message.
    pub fn fail_next_start(&self, message: impl Into<String>) {
        self.state().start_errors.push_back(message.into());
    }

    /// Makes cancellation of streams started from now on fail.
    pub fn fail_cancel(&self, message: impl Into<String>) {
        self.state().cancel_error = Some(message.into());
    }

    /// Makes `reload_config` fail with the given message.
    pub fn fail_reload(&self, message: impl Into<String>) {
        self.state().reload_error = Some(message.into());
    }

    /// Returns every recorded `start` call in order.
    #[must_use]
    pub fn starts(&self) -> Vec<ScriptedStart> {
        self.state().starts.clone()
    }

    /// Returns the handle of the `index`-th started stream.
    #[must_use]
    pub fn stream(&self, index: usize) -> Option<ScriptedStreamHandle> {
        self.state().streams.get(index).cloned()
    }

    /// Returns how many reloads succeeded.
    #[must_use]
    pub fn reload_count(&self) -> usize {
        self.state().reloads
    }
}

#[async_trait]
impl AgentConnector for ScriptedAgent {
    type Agent = Self;

    async fn connect(&self) -> AgentResult<Self> {
        match self.state().connect_error.clone() {
            Some(message) => Err(AgentError::MissingCredential(message)),
            None => Ok(self.clone()),
        }
    }
}

#[async_trait]
impl AgentCapability for ScriptedAgent {
    async fn start(&self, prompt: &str, options: &StartOptions) -> AgentResult<AgentStream> {
        let mut state = self.state();
        state.starts.push(ScriptedStart {
            prompt: prompt.to_owned(),
            options: options.clone(),
        });
        if let Some(message) = state.start_errors.pop_front() {
            return Err(AgentError::runtime(std::io::Error::other(message)));
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        for event in state.scripts.pop_front().unwrap_or_default() {
            sender
                .send(Ok(event))
                .map_err(|err| AgentError::runtime(std::io::Error::other(err.to_string())))?;
        }
        let cancelled = Arc::new(AtomicBool::new(false));
        state.streams.push(ScriptedStreamHandle {
            sender: Arc::new(Mutex::new(Some(sender))),
            cancelled: Arc::clone(&cancelled),
        });
        let canceller = ScriptedCanceller {
            cancelled,
            error: state.cancel_error.clone(),
        };

        let events = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|item| (item, receiver))
        })
        .boxed();
        Ok(AgentStream::new(events, Arc::new(canceller)))
    }

    async fn reload_config(&self) -> AgentResult<()> {
        let mut state = self.state();
        if let Some(message) = state.reload_error.clone() {
            return Err(AgentError::InvalidConfig(message));
        }
        state.reloads += 1;
        Ok(())
    }
}
