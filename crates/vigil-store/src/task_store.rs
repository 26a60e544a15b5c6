use crate::kv::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use vigil_core::{TaskRecord, TaskStatus, VigilError, VigilResult};

/// Default retention window for task records.
pub const DEFAULT_TASK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn task_key(task_id: Uuid) -> String {
    format!("task:{task_id}")
}

/// Durable task records over the shared key-value store.
///
/// Records live under `task:{task_id}` with a retention TTL that every
/// update refreshes. Records are never deleted explicitly; they expire.
/// Writes are last-writer-wins — the orchestrating task for a given
/// `task_id` is its only writer.
#[derive(Clone)]
pub struct TaskStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl TaskStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            ttl: DEFAULT_TASK_TTL,
        }
    }

    pub fn with_ttl(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Create a fresh record in `Pending`.
    pub async fn create(&self, task_id: Uuid, session_id: Uuid) -> VigilResult<TaskRecord> {
        let record = TaskRecord::new(task_id, session_id);
        self.put(&record).await?;
        debug!(task_id = %task_id, session_id = %session_id, "Task record created");
        Ok(record)
    }

    /// Transition a record, refreshing its retention window.
    pub async fn update(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<serde_json::Value>,
    ) -> VigilResult<TaskRecord> {
        let mut record = self.get(task_id).await?;
        record.transition(status, result);
        self.put(&record).await?;
        debug!(task_id = %task_id, status = %status, "Task record updated");
        Ok(record)
    }

    /// Fetch a record; `NotFound` when unknown or expired.
    pub async fn get(&self, task_id: Uuid) -> VigilResult<TaskRecord> {
        let raw = self
            .kv
            .get(&task_key(task_id))
            .await?
            .ok_or_else(|| VigilError::NotFound(task_id.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn put(&self, record: &TaskRecord) -> VigilResult<()> {
        let raw = serde_json::to_string(record)?;
        self.kv.set(&task_key(record.task_id), raw, self.ttl).await
    }
}
