use axum::{Router, routing::get, Json, extract::State, response::Json as ResponseJson};
use tracing::warn;
use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => format!("connected ({})", state.store.backend_tag()),
        Err(e) => {
            warn!("Health check could not reach the store: {}", e);
            "unavailable".to_string()
        }
    };

    let status = if database == "unavailable" { "degraded" } else { "ok" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
    })
}
