use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an orchestration task as seen by pollers.
///
/// Transitions are monotonic: `Pending` → `Running` → one terminal
/// state. `Completed` and `Failed` admit no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// True for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The externally observable record of one orchestration run.
///
/// Only the session's own orchestration task writes a given record;
/// pollers read it through the task store by `task_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub session_id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Null until the record reaches a terminal status.
    pub result: Option<serde_json::Value>,
}

impl TaskRecord {
    pub fn new(task_id: Uuid, session_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            session_id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
        }
    }

    /// Apply a status transition, stamping `updated_at`.
    pub fn transition(&mut self, status: TaskStatus, result: Option<serde_json::Value>) {
        self.status = status;
        self.updated_at = Utc::now();
        if result.is_some() {
            self.result = result;
        }
    }
}
