use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use vigil_core::{AgentKind, SubmitRequest, VigilError};
use vigil_dispatch::Orchestrator;

/// Shared application state.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// The HTTP boundary consumed by callers.
pub struct GatewayServer;

impl GatewayServer {
    pub fn build(orchestrator: Arc<Orchestrator>) -> Router {
        let state = Arc::new(AppState { orchestrator });
        Router::new()
            .route("/tasks", post(submit_task))
            .route("/tasks/full", post(submit_full))
            .route("/tasks/agents/{agent}", post(submit_single_agent))
            .route("/tasks/{task_id}", get(get_task))
            .route("/health", get(health_handler))
            .with_state(state)
    }
}

/// Map an internal error onto the boundary: status plus a terse JSON
/// body. Internals never cross; the full error is logged server-side.
fn error_response(err: &VigilError) -> Response {
    let (status, message) = match err {
        VigilError::NotFound(_) => (StatusCode::NOT_FOUND, "task not found"),
        _ => {
            warn!(error = %err, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    };
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "vigil"}))
}

/// `POST /tasks` — accept a request and return the Pending record
/// immediately; never blocks on agent work.
async fn submit_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> Response {
    match state.orchestrator.submit(request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /tasks/full` — convenience submit pre-filled with every agent.
async fn submit_full(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<SubmitRequest>,
) -> Response {
    request.include_agents = AgentKind::ALL.to_vec();
    request.exclude_agents.clear();
    match state.orchestrator.submit(request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /tasks/agents/{agent}` — convenience submit routed to exactly
/// one agent. Adds no semantics beyond the generic submit.
async fn submit_single_agent(
    State(state): State<Arc<AppState>>,
    Path(agent): Path<String>,
    Json(mut request): Json<SubmitRequest>,
) -> Response {
    let agent: AgentKind = match agent.parse() {
        Ok(agent) => agent,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "unknown agent"})),
            )
                .into_response();
        }
    };
    request.include_agents = vec![agent];
    request.exclude_agents = AgentKind::ALL.into_iter().filter(|&k| k != agent).collect();
    match state.orchestrator.submit(request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /tasks/{task_id}` — current record, or 404 when unknown or
/// past its retention window.
async fn get_task(State(state): State<Arc<AppState>>, Path(task_id): Path<Uuid>) -> Response {
    match state.orchestrator.tasks().get(task_id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => error_response(&e),
    }
}
