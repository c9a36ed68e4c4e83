use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::models::{AppState, Slid};
use crate::payment::{ConfirmRequest, PaymentPhase, PaymentView, SwipeRequest, SwipeResponse};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/slids/{short_id}/payment", get(payment_view))
        .route("/api/slids/{short_id}/swipe", post(swipe))
        .route("/api/slids/{short_id}/abort", post(abort))
        .route("/api/slids/{short_id}/confirm", post(confirm))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    #[serde(default)]
    pub agreed: bool,
}

async fn payment_view(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<PaymentView>> {
    Ok(Json(state.payments.view(&short_id, query.agreed).await?))
}

async fn swipe(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    Json(request): Json<SwipeRequest>,
) -> AppResult<Json<SwipeResponse>> {
    Ok(Json(state.payments.swipe(&short_id, &request).await?))
}

async fn abort(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> AppResult<Json<PaymentPhase>> {
    Ok(Json(state.payments.abort(&short_id).await?))
}

/// Blocks until the transaction is mined (or the configured timeout passes)
async fn confirm(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    Json(request): Json<ConfirmRequest>,
) -> AppResult<Json<Slid>> {
    Ok(Json(state.payments.confirm(&short_id, &request.tx_hash).await?))
}
