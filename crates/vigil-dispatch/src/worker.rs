use crate::dispatcher::DispatchMessage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use vigil_core::{AgentKind, CompletionNotification, VigilResult};
use vigil_store::{notification_channel, MessageBus};

/// One slice of the assessment pipeline: an identifier plus a function
/// from sub-task payload to result. The transport around it is the
/// worker's job, not the handler's.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    fn kind(&self) -> AgentKind;
    async fn handle(&self, task: serde_json::Value) -> VigilResult<serde_json::Value>;
}

/// Subscribe-execute-publish loop for a single agent.
///
/// Listens on the agent's task channel, runs the handler per dispatch
/// message, and publishes a [`CompletionNotification`] on the session's
/// notification channel — status `completed`, or `failed` with the
/// error string when the handler errors. Handler failures never kill
/// the loop.
pub struct AgentWorker {
    handler: Arc<dyn AgentHandler>,
    bus: Arc<dyn MessageBus>,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
}

impl AgentWorker {
    pub fn new(handler: Arc<dyn AgentHandler>, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            handler,
            bus,
            poll_interval: Duration::from_millis(250),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an external stop flag, e.g. from the shutdown guard.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Run until the stop flag is set.
    pub async fn run(&self) -> VigilResult<()> {
        let kind = self.handler.kind();
        let mut sub = self.bus.subscribe(&kind.task_channel()).await?;
        info!(agent = %kind, "Agent worker started");

        while !self.stop.load(Ordering::SeqCst) {
            let Some(raw) = sub.recv(self.poll_interval).await else {
                continue;
            };
            let message: DispatchMessage = match serde_json::from_str(&raw) {
                Ok(m) => m,
                Err(e) => {
                    warn!(agent = %kind, error = %e, "Malformed dispatch message ignored");
                    continue;
                }
            };
            if message.agent != kind {
                continue;
            }
            self.execute(kind, message).await;
        }

        info!(agent = %kind, "Agent worker stopped");
        Ok(())
    }

    async fn execute(&self, kind: AgentKind, message: DispatchMessage) {
        let session_id = message.session_id;
        info!(agent = %kind, session_id = %session_id, "Sub-task accepted");

        let (status, result) = match self.handler.handle(message.payload).await {
            Ok(value) => ("completed", value),
            Err(e) => {
                warn!(agent = %kind, session_id = %session_id, error = %e, "Handler failed");
                ("failed", serde_json::json!({"error": e.to_string()}))
            }
        };

        let notification =
            CompletionNotification::new(kind, session_id, message.scenario_id, status, result);
        let raw = match serde_json::to_string(&notification) {
            Ok(raw) => raw,
            Err(e) => {
                error!(agent = %kind, error = %e, "Completion serialization failed");
                return;
            }
        };
        if let Err(e) = self
            .bus
            .publish(&notification_channel(session_id), raw)
            .await
        {
            // Delivery is best-effort: the session deadline covers loss.
            error!(agent = %kind, session_id = %session_id, error = %e, "Completion publish failed");
        }
    }
}
