use crate::agent::AgentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single agent delegation within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Dispatched,
    Completed,
    Timeout,
}

/// One row per agent the dispatcher decided to invoke for a session.
///
/// The set of delegations for a session is fixed at dispatch time;
/// the collector never waits for agents outside this set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDelegation {
    pub agent: AgentKind,
    /// Store key holding this agent's sub-task config.
    pub task_key: String,
    /// Payload published to the agent.
    pub config: serde_json::Value,
    pub status: DelegationStatus,
}

impl AgentDelegation {
    pub fn new(agent: AgentKind, task_key: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            agent,
            task_key: task_key.into(),
            config,
            status: DelegationStatus::Dispatched,
        }
    }
}

/// Message an agent publishes on finishing its sub-task.
///
/// Ephemeral: consumed once by the collector, loss tolerated via the
/// session deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionNotification {
    pub agent: AgentKind,
    pub session_id: Uuid,
    pub scenario_id: String,
    pub status: String,
    pub result: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl CompletionNotification {
    pub fn new(
        agent: AgentKind,
        session_id: Uuid,
        scenario_id: impl Into<String>,
        status: impl Into<String>,
        result: serde_json::Value,
    ) -> Self {
        Self {
            agent,
            session_id,
            scenario_id: scenario_id.into(),
            status: status.into(),
            result,
            timestamp: Utc::now(),
        }
    }
}

/// Priority hint forwarded to agents inside the sub-task payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A caller's assessment request, as accepted at the HTTP boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-text scenario descriptions matched against agent trigger words.
    #[serde(default)]
    pub scenarios: Vec<String>,
    /// Agents to include regardless of trigger matching.
    #[serde(default)]
    pub include_agents: Vec<AgentKind>,
    /// Agents to exclude even if a trigger matches.
    #[serde(default)]
    pub exclude_agents: Vec<AgentKind>,
    #[serde(default)]
    pub priority: Priority,
    /// Optional webhook to receive the final task record.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Secret for the webhook HMAC signature.
    #[serde(default)]
    pub callback_secret: Option<String>,
}
