use crate::collector::{NotificationCollector, DEFAULT_SESSION_TIMEOUT};
use crate::dispatcher::Dispatcher;
use crate::synthesizer::{ResultSynthesizer, SynthesizedReport};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;
use vigil_core::{
    AgentDelegation, AgentKind, DelegationStatus, SubmitRequest, TaskRecord, TaskStatus,
    VigilResult,
};
use vigil_store::{delegation_key, KvStore, MessageBus, TaskStore, DEFAULT_TASK_TTL};

/// Delivery hook for the final task record, injected by the binary.
/// Implementations must swallow their own failures; the caller can
/// always fall back to polling.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn notify(&self, url: &str, secret: Option<&str>, record: &TaskRecord);
}

/// Timing and retention knobs for the orchestration pipeline.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wall-clock budget shared by every agent in a session.
    pub session_timeout: Duration,
    /// Per-iteration poll timeout in the collector loop.
    pub poll_interval: Duration,
    /// Retention window for task records and delegation configs.
    pub task_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            poll_interval: crate::collector::DEFAULT_POLL_INTERVAL,
            task_ttl: DEFAULT_TASK_TTL,
        }
    }
}

/// The fan-out / fan-in pipeline for one assessment request.
///
/// `submit` is the only entry point: it creates the task record and
/// spawns the session run, returning Pending to the caller immediately.
/// The spawned task is the sole writer of its task record.
#[derive(Clone)]
pub struct Orchestrator {
    tasks: TaskStore,
    kv: Arc<dyn KvStore>,
    dispatcher: Dispatcher,
    collector: NotificationCollector,
    notifier: Option<Arc<dyn CompletionNotifier>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        kv: Arc<dyn KvStore>,
        bus: Arc<dyn MessageBus>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            tasks: TaskStore::with_ttl(kv.clone(), config.task_ttl),
            dispatcher: Dispatcher::with_ttl(kv.clone(), bus.clone(), config.task_ttl),
            collector: NotificationCollector::with_poll_interval(bus, config.poll_interval),
            kv,
            notifier: None,
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn CompletionNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Accept a request: create the Pending record and begin execution
    /// without blocking the caller on any agent work.
    pub async fn submit(&self, request: SubmitRequest) -> VigilResult<TaskRecord> {
        let task_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let record = self.tasks.create(task_id, session_id).await?;

        info!(task_id = %task_id, session_id = %session_id, title = %request.title, "Task accepted");

        let this = self.clone();
        tokio::spawn(async move {
            this.run_session(task_id, session_id, request).await;
        });

        Ok(record)
    }

    /// Drive one session to a terminal status and fire the callback.
    async fn run_session(&self, task_id: Uuid, session_id: Uuid, request: SubmitRequest) {
        let callback_url = request.callback_url.clone();
        let callback_secret = request.callback_secret.clone();

        let terminal = match self.execute(task_id, session_id, &request).await {
            Ok(report) => {
                let result = match serde_json::to_value(&report) {
                    Ok(v) => v,
                    Err(e) => serde_json::json!({"error": e.to_string()}),
                };
                self.tasks
                    .update(task_id, TaskStatus::Completed, Some(result))
                    .await
            }
            Err(e) => {
                // Orchestration failures are fatal to the session; the
                // message is captured, internals stay on this side.
                error!(task_id = %task_id, session_id = %session_id, error = %e, "Session failed");
                self.tasks
                    .update(
                        task_id,
                        TaskStatus::Failed,
                        Some(serde_json::json!({"error": e.to_string()})),
                    )
                    .await
            }
        };

        let record = match terminal {
            Ok(record) => record,
            Err(e) => {
                error!(task_id = %task_id, error = %e, "Terminal status write failed");
                return;
            }
        };

        if let (Some(url), Some(notifier)) = (callback_url, &self.notifier) {
            notifier
                .notify(&url, callback_secret.as_deref(), &record)
                .await;
        }
    }

    async fn execute(
        &self,
        task_id: Uuid,
        session_id: Uuid,
        request: &SubmitRequest,
    ) -> VigilResult<SynthesizedReport> {
        self.tasks.update(task_id, TaskStatus::Running, None).await?;

        // Subscribe before fan-out so an instant completion is not lost.
        let sub = self.collector.subscribe(session_id).await?;
        let delegations = self.dispatcher.orchestrate(session_id, request).await?;
        let expected: Vec<AgentKind> = delegations.iter().map(|d| d.agent).collect();

        let results = self
            .collector
            .collect_on(
                sub,
                session_id,
                expected.iter().copied().collect::<HashSet<_>>(),
                self.config.session_timeout,
            )
            .await;

        self.settle_delegations(session_id, &results).await;
        Ok(ResultSynthesizer::synthesize(session_id, &expected, results))
    }

    /// Write final per-agent statuses back onto the delegation records.
    /// Best-effort; a failure here does not fail the session.
    async fn settle_delegations(
        &self,
        session_id: Uuid,
        results: &HashMap<AgentKind, serde_json::Value>,
    ) {
        for (&agent, payload) in results {
            let status = if payload["status"] == "timeout" {
                DelegationStatus::Timeout
            } else {
                DelegationStatus::Completed
            };
            let key = delegation_key(session_id, agent);
            let updated = async {
                let raw = self
                    .kv
                    .get(&key)
                    .await?
                    .ok_or_else(|| vigil_core::VigilError::Store(format!("missing {key}")))?;
                let mut delegation: AgentDelegation = serde_json::from_str(&raw)?;
                delegation.status = status;
                self.kv
                    .set(&key, serde_json::to_string(&delegation)?, self.config.task_ttl)
                    .await
            }
            .await;
            if let Err(e) = updated {
                warn!(session_id = %session_id, agent = %agent, error = %e, "Delegation settle failed");
            }
        }
    }
}
