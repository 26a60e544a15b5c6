use async_trait::async_trait;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::error;
use vigil_core::{AgentKind, VigilResult};
use vigil_dispatch::{AgentHandler, AgentWorker};
use vigil_store::MessageBus;

/// Placeholder assessor registered when no real analysis tool is
/// wired up for an agent kind. It acknowledges the sub-task with an
/// empty findings list so a standalone deployment still exercises the
/// full dispatch/collect path.
struct PlaceholderAssessor {
    kind: AgentKind,
}

#[async_trait]
impl AgentHandler for PlaceholderAssessor {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn handle(&self, task: serde_json::Value) -> VigilResult<serde_json::Value> {
        Ok(serde_json::json!({
            "findings": [],
            "scenario_id": task["scenario_id"],
            "note": format!("no {} assessor configured; sub-task acknowledged", self.kind),
        }))
    }
}

/// Spawn one worker per fleet member, all sharing the given stop flag.
pub fn spawn_fleet(bus: Arc<dyn MessageBus>, stop: Arc<AtomicBool>) {
    for kind in AgentKind::ALL {
        let worker = AgentWorker::new(Arc::new(PlaceholderAssessor { kind }), bus.clone())
            .with_stop_flag(stop.clone());
        tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!(agent = %kind, error = %e, "Agent worker exited with error");
            }
        });
    }
}
