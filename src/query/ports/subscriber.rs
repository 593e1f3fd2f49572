//! Outbound port for domain event subscribers.

use crate::query::domain::{DomainEvent, OrchestratorState};
use async_trait::async_trait;

/// Receives orchestrator notifications.
///
/// Each subscriber is driven by its own task, so a slow implementation only
/// delays its own notifications. Notifications arrive in publication order.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Handles one domain event.
    async fn on_event(&self, event: &DomainEvent);

    /// Handles a state transition. Ignored by default.
    async fn on_state_change(&self, _state: OrchestratorState) {}
}
