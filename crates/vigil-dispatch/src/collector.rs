use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vigil_core::{AgentKind, CompletionNotification, VigilResult};
use vigil_store::{notification_channel, MessageBus, Subscription};

/// Default wall-clock budget for one session's fan-in.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(1800);

/// Default per-iteration poll timeout inside the wait loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Synthetic result recorded for an agent that missed the deadline.
fn timeout_result() -> serde_json::Value {
    serde_json::json!({
        "status": "timeout",
        "error": "did not complete within timeout",
    })
}

/// Waits for one completion notification per dispatched agent, bounded
/// by a single wall-clock deadline for the whole session.
///
/// Duplicates and messages from agents outside the expected set are
/// ignored, so at-least-once delivery is tolerated. Timeouts are a
/// normal, reportable outcome — `collect` never errors on missing
/// completions. A late completion arriving after the deadline is
/// dropped; the wait loop has already exited.
#[derive(Clone)]
pub struct NotificationCollector {
    bus: Arc<dyn MessageBus>,
    poll_interval: Duration,
}

impl NotificationCollector {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self {
            bus,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(bus: Arc<dyn MessageBus>, poll_interval: Duration) -> Self {
        Self { bus, poll_interval }
    }

    /// Subscribe to the session's completion channel. Call before
    /// dispatching so completions published immediately are not lost.
    pub async fn subscribe(&self, session_id: Uuid) -> VigilResult<Subscription> {
        self.bus.subscribe(&notification_channel(session_id)).await
    }

    /// Subscribe and collect in one call.
    pub async fn collect(
        &self,
        session_id: Uuid,
        expected: HashSet<AgentKind>,
        timeout: Duration,
    ) -> VigilResult<HashMap<AgentKind, serde_json::Value>> {
        let sub = self.subscribe(session_id).await?;
        Ok(self.collect_on(sub, session_id, expected, timeout).await)
    }

    /// Drain completions from an existing subscription until every
    /// expected agent has reported or the deadline elapses.
    pub async fn collect_on(
        &self,
        mut sub: Subscription,
        session_id: Uuid,
        expected: HashSet<AgentKind>,
        timeout: Duration,
    ) -> HashMap<AgentKind, serde_json::Value> {
        let deadline = Instant::now() + timeout;
        let mut pending = expected;
        let mut results = HashMap::new();

        while !pending.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wait = self.poll_interval.min(deadline - now);

            let Some(raw) = sub.recv(wait).await else {
                continue;
            };
            let notification: CompletionNotification = match serde_json::from_str(&raw) {
                Ok(n) => n,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Malformed completion message ignored");
                    continue;
                }
            };
            if notification.session_id != session_id {
                debug!(
                    session_id = %session_id,
                    other = %notification.session_id,
                    "Cross-session message ignored"
                );
                continue;
            }
            if !pending.remove(&notification.agent) {
                // Duplicate, or an agent outside the dispatched set.
                debug!(
                    session_id = %session_id,
                    agent = %notification.agent,
                    "Unexpected completion ignored"
                );
                continue;
            }

            info!(
                session_id = %session_id,
                agent = %notification.agent,
                status = %notification.status,
                "Completion received"
            );
            results.insert(
                notification.agent,
                serde_json::json!({
                    "status": notification.status,
                    "scenario_id": notification.scenario_id,
                    "result": notification.result,
                }),
            );
        }

        for agent in pending {
            warn!(session_id = %session_id, agent = %agent, "Agent timed out");
            results.insert(agent, timeout_result());
        }
        results
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use vigil_store::MemoryStore;

    fn collector(store: Arc<MemoryStore>) -> NotificationCollector {
        NotificationCollector::with_poll_interval(store, Duration::from_millis(20))
    }

    async fn publish_completion(
        store: &MemoryStore,
        session_id: Uuid,
        agent: AgentKind,
        status: &str,
        result: serde_json::Value,
    ) {
        let n = CompletionNotification::new(agent, session_id, "scn-1", status, result);
        store
            .publish(
                &notification_channel(session_id),
                serde_json::to_string(&n).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn returns_early_when_all_report() {
        let store = Arc::new(MemoryStore::new());
        let c = collector(store.clone());
        let session_id = Uuid::new_v4();
        let sub = c.subscribe(session_id).await.unwrap();

        publish_completion(
            &store,
            session_id,
            AgentKind::Security,
            "completed",
            serde_json::json!({"findings": []}),
        )
        .await;

        let start = std::time::Instant::now();
        let results = c
            .collect_on(
                sub,
                session_id,
                HashSet::from([AgentKind::Security]),
                Duration::from_secs(5),
            )
            .await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(results.len(), 1);
        assert_eq!(results[&AgentKind::Security]["status"], "completed");
    }

    #[tokio::test]
    async fn stragglers_get_timeout_results_at_deadline() {
        let store = Arc::new(MemoryStore::new());
        let c = collector(store.clone());
        let session_id = Uuid::new_v4();
        let sub = c.subscribe(session_id).await.unwrap();

        publish_completion(
            &store,
            session_id,
            AgentKind::Security,
            "completed",
            serde_json::json!({"ok": true}),
        )
        .await;

        let budget = Duration::from_millis(150);
        let start = std::time::Instant::now();
        let results = c
            .collect_on(
                sub,
                session_id,
                HashSet::from([AgentKind::Security, AgentKind::Performance]),
                budget,
            )
            .await;
        let elapsed = start.elapsed();

        // Returns at approximately the deadline, not earlier, not much later.
        assert!(elapsed >= Duration::from_millis(140));
        assert!(elapsed < Duration::from_millis(600));

        assert_eq!(results[&AgentKind::Security]["status"], "completed");
        assert_eq!(results[&AgentKind::Performance]["status"], "timeout");
        assert_eq!(
            results[&AgentKind::Performance]["error"],
            "did not complete within timeout"
        );
    }

    #[tokio::test]
    async fn duplicates_and_out_of_set_agents_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let c = collector(store.clone());
        let session_id = Uuid::new_v4();
        let sub = c.subscribe(session_id).await.unwrap();

        publish_completion(
            &store,
            session_id,
            AgentKind::Security,
            "completed",
            serde_json::json!({"first": true}),
        )
        .await;
        // Duplicate with a different body: must not overwrite.
        publish_completion(
            &store,
            session_id,
            AgentKind::Security,
            "completed",
            serde_json::json!({"second": true}),
        )
        .await;
        // Out-of-set agent: must not appear in the map.
        publish_completion(
            &store,
            session_id,
            AgentKind::Regression,
            "completed",
            serde_json::json!({}),
        )
        .await;

        let results = c
            .collect_on(
                sub,
                session_id,
                HashSet::from([AgentKind::Security]),
                Duration::from_millis(300),
            )
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[&AgentKind::Security]["result"]["first"], true);
    }

    #[tokio::test]
    async fn cross_session_messages_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let c = collector(store.clone());
        let session_id = Uuid::new_v4();
        let sub = c.subscribe(session_id).await.unwrap();

        // Wrong session id on the right channel.
        let other = CompletionNotification::new(
            AgentKind::Security,
            Uuid::new_v4(),
            "scn-x",
            "completed",
            serde_json::json!({}),
        );
        store
            .publish(
                &notification_channel(session_id),
                serde_json::to_string(&other).unwrap(),
            )
            .await
            .unwrap();

        let results = c
            .collect_on(
                sub,
                session_id,
                HashSet::from([AgentKind::Security]),
                Duration::from_millis(120),
            )
            .await;
        assert_eq!(results[&AgentKind::Security]["status"], "timeout");
    }

    #[tokio::test]
    async fn empty_expected_set_returns_immediately() {
        let store = Arc::new(MemoryStore::new());
        let c = collector(store);
        let session_id = Uuid::new_v4();

        let start = std::time::Instant::now();
        let results = c
            .collect(session_id, HashSet::new(), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn failed_agent_status_recorded_verbatim() {
        let store = Arc::new(MemoryStore::new());
        let c = collector(store.clone());
        let session_id = Uuid::new_v4();
        let sub = c.subscribe(session_id).await.unwrap();

        publish_completion(
            &store,
            session_id,
            AgentKind::Resilience,
            "failed",
            serde_json::json!({"error": "probe crashed"}),
        )
        .await;

        let results = c
            .collect_on(
                sub,
                session_id,
                HashSet::from([AgentKind::Resilience]),
                Duration::from_secs(2),
            )
            .await;
        assert_eq!(results[&AgentKind::Resilience]["status"], "failed");
        assert_eq!(
            results[&AgentKind::Resilience]["result"]["error"],
            "probe crashed"
        );
    }
}
