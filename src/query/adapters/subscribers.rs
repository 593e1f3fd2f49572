//! Subscriber adapters for forwarding notifications to transports.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use crate::query::{
    domain::{DomainEvent, Notification, OrchestratorState},
    ports::EventSubscriber,
};

/// Forwards every notification into an unbounded channel.
///
/// Useful for in-process transports that prefer pulling notifications.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelSubscriber {
    /// Creates a subscriber and the receiver it feeds.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, notification: Notification) {
        // A dropped receiver just means nobody is listening any more.
        if self.sender.send(notification).is_err() {
            debug!("channel subscriber receiver dropped");
        }
    }
}

#[async_trait]
impl EventSubscriber for ChannelSubscriber {
    async fn on_event(&self, event: &DomainEvent) {
        self.forward(Notification::Event(event.clone()));
    }

    async fn on_state_change(&self, state: OrchestratorState) {
        self.forward(Notification::StateChanged(state));
    }
}

/// Writes each notification as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSubscriber<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSubscriber<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer, consuming the subscriber.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Writes any serialisable value as one line on the shared writer.
    ///
    /// Serialisation and write failures are logged rather than returned.
    pub async fn write_line<T>(&self, value: &T)
    where
        T: Serialize + Sync + ?Sized,
    {
        let mut line = match serde_json::to_vec(value) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "output line could not be serialised");
                return;
            }
        };
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        let written = match writer.write_all(&line).await {
            Ok(()) => writer.flush().await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            warn!(error = %err, "output line could not be written");
        }
    }
}

#[async_trait]
impl<W> EventSubscriber for JsonLinesSubscriber<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn on_event(&self, event: &DomainEvent) {
        self.write_line(&Notification::Event(event.clone())).await;
    }

    async fn on_state_change(&self, state: OrchestratorState) {
        self.write_line(&Notification::StateChanged(state)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn json_lines_subscriber_writes_one_line_per_notification() {
        let subscriber = JsonLinesSubscriber::new(Vec::new());

        subscriber
            .on_state_change(OrchestratorState::Running)
            .await;
        subscriber.on_event(&DomainEvent::result("done")).await;

        let output = String::from_utf8(subscriber.into_inner()).expect("output is UTF-8");
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).expect("line is JSON"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().map(|line| &line["kind"]), Some(&Value::from("state_changed")));
        assert_eq!(
            lines.get(1).map(|line| &line["payload"]["type"]),
            Some(&Value::from("result"))
        );
    }
}
