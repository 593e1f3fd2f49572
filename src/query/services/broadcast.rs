//! Fan-out of orchestrator notifications to registered subscribers.

use crate::query::{
    domain::{Notification, SubscriptionId},
    ports::EventSubscriber,
};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tracing::{debug, warn};

/// Publishes notifications to every registered subscriber.
///
/// Every subscriber owns a bounded queue drained by a dedicated task.
/// Publishing waits at most `publish_timeout` per subscriber; a subscriber
/// that cannot keep up loses that notification instead of stalling the
/// stream.
#[derive(Debug)]
pub struct EventBroadcaster {
    subscribers: RwLock<Vec<(SubscriptionId, mpsc::Sender<Notification>)>>,
    buffer: usize,
    publish_timeout: Duration,
}

impl EventBroadcaster {
    /// Creates a broadcaster with the given per-subscriber queue size and
    /// publish timeout.
    #[must_use]
    pub fn new(buffer: usize, publish_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            buffer: buffer.max(1),
            publish_timeout,
        }
    }

    /// Registers a subscriber and spawns its delivery task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        let id = SubscriptionId::new();
        let (sender, mut receiver) = mpsc::channel::<Notification>(self.buffer);
        tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                match notification {
                    Notification::Event(event) => subscriber.on_event(&event).await,
                    Notification::StateChanged(state) => subscriber.on_state_change(state).await,
                }
            }
        });
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, sender));
        debug!(subscription = %id, "subscriber registered");
        id
    }

    /// Removes a subscriber. Returns `false` when the token is unknown.
    ///
    /// Notifications already queued for the subscriber are still delivered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(candidate, _)| *candidate != id);
        before != subscribers.len()
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers a notification to every subscriber, in registration order.
    pub async fn publish(&self, notification: Notification) {
        let targets: Vec<(SubscriptionId, mpsc::Sender<Notification>)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, sender) in targets {
            match sender
                .send_timeout(notification.clone(), self.publish_timeout)
                .await
            {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    warn!(subscription = %id, "subscriber is too slow; notification dropped");
                }
                Err(SendTimeoutError::Closed(_)) => {
                    debug!(subscription = %id, "subscriber task has stopped");
                }
            }
        }
    }
}
