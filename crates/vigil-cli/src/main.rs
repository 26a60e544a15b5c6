use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil_dispatch::{Orchestrator, OrchestratorConfig};
use vigil_gateway::{GatewayServer, WebhookNotifier};
use vigil_resilience::GracefulShutdown;
use vigil_store::MemoryStore;

mod agents;

#[derive(Parser)]
#[command(name = "vigil", about = "Vigil — QA agent fleet coordinator")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "vigil.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coordination server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Deserialize, Default)]
struct VigilConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    orchestration: OrchestrationConfig,
}

#[derive(Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize)]
struct OrchestrationConfig {
    #[serde(default = "default_session_timeout_secs")]
    session_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default = "default_task_ttl_hours")]
    task_ttl_hours: u64,
    /// Spawn placeholder assessors for the whole fleet. Disable when
    /// real assessors connect to the bus out of process.
    #[serde(default = "default_builtin_agents")]
    builtin_agents: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: default_session_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            task_ttl_hours: default_task_ttl_hours(),
            builtin_agents: default_builtin_agents(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_session_timeout_secs() -> u64 {
    1800
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_task_ttl_hours() -> u64 {
    24
}
fn default_builtin_agents() -> bool {
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Missing config file means defaults; a malformed one is an error.
    let config: VigilConfig = match tokio::fs::read_to_string(&cli.config).await {
        Ok(raw) => toml::from_str(&raw)?,
        Err(_) => {
            info!(path = %cli.config.display(), "No config file, using defaults");
            VigilConfig::default()
        }
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let store = Arc::new(MemoryStore::new());
            let orchestrator_config = OrchestratorConfig {
                session_timeout: Duration::from_secs(config.orchestration.session_timeout_secs),
                poll_interval: Duration::from_millis(config.orchestration.poll_interval_ms),
                task_ttl: Duration::from_secs(config.orchestration.task_ttl_hours * 3600),
            };
            let orchestrator = Arc::new(
                Orchestrator::new(store.clone(), store.clone(), orchestrator_config)
                    .with_notifier(Arc::new(WebhookNotifier::new())),
            );

            let shutdown = Arc::new(GracefulShutdown::new());
            shutdown.listen();

            if config.orchestration.builtin_agents {
                agents::spawn_fleet(store.clone(), shutdown.stop_flag());
                info!("Placeholder assessor fleet spawned");
            }
            shutdown.on_cleanup("agent-workers", {
                let stop = shutdown.stop_flag();
                move || async move {
                    // Workers watch the shared flag; latching it here
                    // covers programmatic shutdown paths too.
                    stop.store(true, Ordering::SeqCst);
                    Ok(())
                }
            });

            let app = GatewayServer::build(orchestrator);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(addr = %addr, "Vigil gateway listening");

            let stop = shutdown.stop_flag();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    while !stop.load(Ordering::SeqCst) {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                })
                .await?;

            shutdown.shutdown().await;
            info!("Vigil gateway stopped");
        }
    }

    Ok(())
}
