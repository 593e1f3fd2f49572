//! Child process plumbing: stdout event framing and kill supervision.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::query::{
    domain::RawEvent,
    ports::{AgentError, AgentResult, RawEventStream, StreamCanceller},
};

type KillReply = oneshot::Sender<std::io::Result<()>>;

/// Frames agent standard output into raw events.
///
/// Blank lines are ignored and lines that are not valid events are logged
/// and skipped. The stream ends when the process closes its output.
pub(super) fn event_lines(stdout: ChildStdout) -> RawEventStream {
    frame_events(stdout).boxed()
}

fn frame_events<R>(reader: R) -> impl futures::Stream<Item = AgentResult<RawEvent>> + Send
where
    R: AsyncRead + Unpin + Send + 'static,
{
    stream::unfold(Some(BufReader::new(reader).lines()), |state| async move {
        let mut lines = state?;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = parse_line(&line) {
                        return Some((Ok(event), Some(lines)));
                    }
                }
                Ok(None) => return None,
                Err(err) => return Some((Err(AgentError::runtime(err)), None)),
            }
        }
    })
}

fn parse_line(line: &str) -> Option<RawEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "skipping malformed agent output line");
            None
        }
    }
}

/// Forwards agent diagnostics to the debug log.
pub(super) async fn drain_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "gropius::agent", "{line}");
    }
}

/// Owns the child until it exits or a kill is requested.
///
/// Kill requests that arrive after the child exited are acknowledged
/// immediately. The task ends once every canceller has been dropped.
pub(super) async fn supervise(mut child: Child, mut kill_requests: mpsc::Receiver<KillReply>) {
    tokio::select! {
        exit = child.wait() => match exit {
            Ok(status) if status.success() => debug!("agent process exited"),
            Ok(status) => warn!(%status, "agent process exited unsuccessfully"),
            Err(err) => warn!(error = %err, "failed to wait for agent process"),
        },
        Some(reply) = kill_requests.recv() => {
            let result = child.kill().await;
            if reply.send(result).is_err() {
                debug!("kill requester went away before the reply");
            }
            return;
        }
    }
    while let Some(reply) = kill_requests.recv().await {
        if reply.send(Ok(())).is_err() {
            debug!("kill requester went away before the reply");
        }
    }
}

/// Cancels a stream by killing its agent process.
#[derive(Debug, Clone)]
pub(super) struct ProcessCanceller {
    kill_requests: mpsc::Sender<KillReply>,
}

impl ProcessCanceller {
    pub(super) fn channel() -> (Self, mpsc::Receiver<KillReply>) {
        let (kill_requests, receiver) = mpsc::channel(1);
        (Self { kill_requests }, receiver)
    }
}

#[async_trait]
impl StreamCanceller for ProcessCanceller {
    async fn cancel(&self) -> AgentResult<()> {
        let (reply, response) = oneshot::channel();
        if self.kill_requests.send(reply).await.is_err() {
            // Supervisor finished: the process has already been reaped.
            return Ok(());
        }
        match response.await {
            Ok(Ok(())) | Err(_) => Ok(()),
            Ok(Err(err)) => Err(AgentError::runtime(err)),
        }
    }
}
