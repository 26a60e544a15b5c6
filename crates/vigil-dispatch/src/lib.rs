//! Task dispatch, fan-in, and synthesis for the Vigil orchestrator.
//!
//! The pipeline for one session: [`Dispatcher`] fans the request out to
//! the routed agents, [`NotificationCollector`] waits for completions
//! under a single wall-clock budget, [`ResultSynthesizer`] merges the
//! payloads into one report, and [`Orchestrator`] drives the whole run
//! and owns the task record. [`AgentWorker`] is the transport loop an
//! agent implementation plugs into via [`AgentHandler`].

pub mod collector;
pub mod dispatcher;
pub mod engine;
pub mod routing;
pub mod synthesizer;
pub mod worker;

pub use collector::{NotificationCollector, DEFAULT_POLL_INTERVAL, DEFAULT_SESSION_TIMEOUT};
pub use dispatcher::{DispatchMessage, Dispatcher};
pub use engine::{CompletionNotifier, Orchestrator, OrchestratorConfig};
pub use routing::route;
pub use synthesizer::{ResultSynthesizer, RiskSummary, SynthesizedReport};
pub use worker::{AgentHandler, AgentWorker};
