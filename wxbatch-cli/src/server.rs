// HTTP front-end over the batch orchestrator
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use wxbatch_core::{BatchOrchestrator, Envelope};

#[derive(Debug)]
pub struct AppState {
    pub batch: BatchOrchestrator,
    pub locations: Vec<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(weather))
        .route("/healthz", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, batch: BatchOrchestrator, locations: Vec<String>) -> anyhow::Result<()> {
    let state = Arc::new(AppState { batch, locations });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Starting wxbatch server on {addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}

/// Weather for every configured location.
async fn weather(State(state): State<Arc<AppState>>) -> Response {
    // Run the batch on its own task so a failure in the orchestration itself
    // still gets an error envelope instead of a dropped connection.
    let task_state = Arc::clone(&state);
    let batch = tokio::spawn(async move { task_state.batch.fetch_all(&task_state.locations).await });

    match batch.await {
        Ok(records) => Json(Envelope::success(records)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error in weather endpoint");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::error(e.to_string()))).into_response()
        }
    }
}
