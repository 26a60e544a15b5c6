use crate::routing::route;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;
use vigil_core::{AgentDelegation, AgentKind, Priority, SubmitRequest, VigilResult};
use vigil_store::{delegation_key, KvStore, MessageBus, DEFAULT_TASK_TTL};

/// Message published on `{agent}:tasks` to hand a sub-task to a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub agent: AgentKind,
    pub session_id: Uuid,
    pub scenario_id: String,
    pub priority: Priority,
    pub payload: serde_json::Value,
}

/// Fans a request out to the agents selected by the routing predicate.
#[derive(Clone)]
pub struct Dispatcher {
    kv: Arc<dyn KvStore>,
    bus: Arc<dyn MessageBus>,
    ttl: Duration,
}

impl Dispatcher {
    pub fn new(kv: Arc<dyn KvStore>, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            kv,
            bus,
            ttl: DEFAULT_TASK_TTL,
        }
    }

    pub fn with_ttl(kv: Arc<dyn KvStore>, bus: Arc<dyn MessageBus>, ttl: Duration) -> Self {
        Self { kv, bus, ttl }
    }

    /// Build, persist, and announce one sub-task per routed agent.
    ///
    /// The returned delegation set is fixed for the session; the
    /// collector never waits for agents outside it. An agent is never
    /// invoked twice for the same session.
    pub async fn orchestrate(
        &self,
        session_id: Uuid,
        request: &SubmitRequest,
    ) -> VigilResult<Vec<AgentDelegation>> {
        let selected = route(request);
        let mut delegations = Vec::with_capacity(selected.len());

        for agent in selected {
            let scenario_id = format!("{agent}-{}", Uuid::new_v4());
            let payload = serde_json::json!({
                "session_id": session_id,
                "scenario_id": scenario_id,
                "title": request.title,
                "description": request.description,
                "scenarios": request.scenarios,
                "priority": request.priority,
            });

            let key = delegation_key(session_id, agent);
            let delegation = AgentDelegation::new(agent, key.clone(), payload.clone());
            self.kv
                .set(&key, serde_json::to_string(&delegation)?, self.ttl)
                .await?;

            let message = DispatchMessage {
                agent,
                session_id,
                scenario_id,
                priority: request.priority,
                payload,
            };
            self.bus
                .publish(&agent.task_channel(), serde_json::to_string(&message)?)
                .await?;

            info!(session_id = %session_id, agent = %agent, "Sub-task dispatched");
            delegations.push(delegation);
        }

        info!(
            session_id = %session_id,
            agent_count = delegations.len(),
            "Fan-out complete"
        );
        Ok(delegations)
    }
}
