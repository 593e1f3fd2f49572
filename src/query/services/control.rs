//! Administrative control surface layered over the orchestrator.

use super::orchestrator::{OrchestratorResult, QueryOrchestrator};
use crate::query::{
    domain::{OrchestratorStatus, RestartOptions, SubmitOutcome},
    ports::{AgentConnector, SessionStore},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Administrative request accepted by [`ControlSurface::handle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlRequest {
    /// Discard the conversation and optionally submit a kickoff prompt.
    RestartAgent {
        /// Prompt submitted after the reset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kickoff: Option<String>,
    },
    /// Report state, session and uptime.
    GetStatus,
    /// Reload the agent's capability registry.
    ReloadConfig,
}

/// Reply to a [`ControlRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlResponse {
    /// Current status snapshot.
    Status {
        /// The snapshot.
        status: OrchestratorStatus,
    },
    /// The agent was restarted.
    Restarted {
        /// Outcome of the kickoff submission, when one was given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outcome: Option<SubmitOutcome>,
    },
    /// The capability registry was reloaded.
    ConfigReloaded,
    /// The operation failed.
    Error {
        /// Orchestrator error message.
        message: String,
    },
}

/// Thin administrative facade: each operation maps to one orchestrator call.
pub struct ControlSurface<K, S, C>
where
    K: AgentConnector + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    orchestrator: QueryOrchestrator<K, S, C>,
}

impl<K, S, C> ControlSurface<K, S, C>
where
    K: AgentConnector + 'static,
    S: SessionStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Wraps an orchestrator handle.
    #[must_use]
    pub const fn new(orchestrator: QueryOrchestrator<K, S, C>) -> Self {
        Self { orchestrator }
    }

    /// The wrapped orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &QueryOrchestrator<K, S, C> {
        &self.orchestrator
    }

    /// Restarts the agent; see [`QueryOrchestrator::restart`].
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's restart error.
    pub async fn restart_agent(
        &self,
        kickoff: Option<String>,
    ) -> OrchestratorResult<Option<SubmitOutcome>> {
        self.orchestrator.restart(RestartOptions { kickoff }).await
    }

    /// Returns the orchestrator status.
    pub async fn get_status(&self) -> OrchestratorStatus {
        self.orchestrator.status().await
    }

    /// Reloads the agent's capability registry.
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's reload error.
    pub async fn reload_config(&self) -> OrchestratorResult<()> {
        self.orchestrator.reload_config().await
    }

    /// Executes a serialized control request.
    pub async fn handle(&self, request: ControlRequest) -> ControlResponse {
        let result = match request {
            ControlRequest::RestartAgent { kickoff } => self
                .restart_agent(kickoff)
                .await
                .map(|outcome| ControlResponse::Restarted { outcome }),
            ControlRequest::GetStatus => Ok(ControlResponse::Status {
                status: self.get_status().await,
            }),
            ControlRequest::ReloadConfig => self
                .reload_config()
                .await
                .map(|()| ControlResponse::ConfigReloaded),
        };
        result.unwrap_or_else(|err| ControlResponse::Error {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"op": "get_status"}), ControlRequest::GetStatus)]
    #[case(json!({"op": "reload_config"}), ControlRequest::ReloadConfig)]
    #[case(json!({"op": "restart_agent"}), ControlRequest::RestartAgent { kickoff: None })]
    #[case(
        json!({"op": "restart_agent", "kickoff": "hello"}),
        ControlRequest::RestartAgent { kickoff: Some("hello".to_owned()) }
    )]
    fn control_requests_deserialize_by_op(
        #[case] value: serde_json::Value,
        #[case] expected: ControlRequest,
    ) {
        let request: ControlRequest = serde_json::from_value(value).expect("valid request");

        assert_eq!(request, expected);
    }

    #[rstest]
    fn error_response_carries_the_message() {
        let response = ControlResponse::Error {
            message: "orchestrator has not been initialised".to_owned(),
        };

        assert_eq!(
            serde_json::to_value(&response).expect("serializable"),
            json!({"op": "error", "message": "orchestrator has not been initialised"})
        );
    }
}
