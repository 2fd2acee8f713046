//! Network ingest endpoint.
//!
//! `POST /ingest` accepts `{user_id, thread_id, turns}` where each turn is a
//! string or an object with a `text`/`content` field, runs the pipeline, and
//! bulk-inserts the produced artifacts in one transaction. The response is
//! `{"knowledge_ids": [...]}` on success; failures always carry a JSON
//! `error` field — 400 for malformed requests (before any segmentation is
//! attempted), 500 for persistence failure. `GET /health` reports liveness.
//!
//! The request body is taken raw rather than through the JSON extractor so
//! malformed JSON produces the documented error shape instead of the
//! framework's default rejection.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::{error, info, instrument};

use crate::pipeline::Pipeline;
use crate::store::ArtifactStore;

/// Shared handler state: one pipeline, one store gateway.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn ArtifactStore>,
}

/// Build the service router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "ingest service listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[instrument(skip_all)]
async fn ingest(State(state): State<AppState>, body: String) -> Response {
    let payload: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON payload"),
    };

    let (Some(_user_id), Some(_thread_id), Some(turns)) = (
        payload.get("user_id"),
        payload.get("thread_id"),
        payload.get("turns").and_then(Value::as_array),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: user_id, thread_id, turns",
        );
    };

    let run = state.pipeline.run_turns(turns).await;

    // An empty run never touches the store gateway.
    if !run.artifacts.is_empty() {
        if let Err(err) = state.store.insert_artifacts(&run.artifacts).await {
            error!(error = %err, "artifact persistence failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("DB insertion failed: {err}"),
            );
        }
    }

    Json(json!({"knowledge_ids": run.artifact_ids()})).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}
