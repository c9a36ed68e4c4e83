//! Invoice CRUD endpoints.
//!
//! Each handler performs exactly one read or one write against the store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use validator::Validate;

use crate::links;
use crate::models::{
    is_address, AppState, CreateSlidRequest, CreateSlidResponse, DashboardQuery,
    DashboardResponse, DashboardStats, NewSlid, ReceiptResponse, ShareResponse, Slid, SlidStatus,
};
use crate::payment::chain::explorer_tx_url;
use crate::types::{AppError, AppResult};
use crate::utils::{generate_short_id, is_short_id};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/slids", get(list_slids).post(create_slid))
        .route("/api/slids/{short_id}", get(get_slid))
        .route("/api/slids/{short_id}/share", get(share_slid))
        .route("/api/slids/{short_id}/receipt", get(receipt))
        .with_state(state)
}

pub(crate) async fn load_slid(state: &AppState, short_id: &str) -> AppResult<Slid> {
    if !is_short_id(short_id) {
        return Err(AppError::NotFound(format!("invoice {}", short_id)));
    }
    state
        .store
        .get_by_short_id(short_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {}", short_id)))
}

/// Validate the form and write one `pending` row
pub(crate) async fn create(state: &AppState, request: CreateSlidRequest) -> AppResult<CreateSlidResponse> {
    let request = request.normalized();
    request.validate()?;

    let new_slid = NewSlid {
        short_id: generate_short_id(),
        creator_address: request.creator_address,
        client_name: request.client_name,
        client_email: request.client_email,
        amount: request.amount,
        description: request.description,
        scope: request.scope,
        terms: request.terms,
        status: SlidStatus::Pending,
    };

    let slid = state.store.insert(new_slid).await?;
    info!(short_id = %slid.short_id, creator = %slid.creator_address, amount = %slid.amount, "Invoice created");

    let app_url = &state.config.server.app_url;
    Ok(CreateSlidResponse {
        short_id: slid.short_id.clone(),
        share_url: links::share_url(app_url, &slid.short_id),
        pay_url: links::pay_url(app_url, &slid.short_id),
        slid,
    })
}

pub(crate) async fn dashboard(state: &AppState, creator: &str) -> AppResult<DashboardResponse> {
    let creator_address = creator.trim().to_lowercase();
    if !is_address(&creator_address) {
        return Err(AppError::InvalidRequest(format!("invalid creator address: {}", creator)));
    }

    let slids = state.store.list_by_creator(&creator_address).await?;
    Ok(DashboardResponse {
        stats: DashboardStats::from_slids(&slids),
        creator_address,
        slids,
    })
}

pub(crate) fn share(state: &AppState, slid: Slid) -> ShareResponse {
    let pay_url = links::pay_url(&state.config.server.app_url, &slid.short_id);
    ShareResponse {
        links: links::share_links(&pay_url, &slid),
        pay_url,
        slid,
    }
}

async fn create_slid(
    State(state): State<AppState>,
    Json(request): Json<CreateSlidRequest>,
) -> AppResult<(StatusCode, Json<CreateSlidResponse>)> {
    let response = create(&state, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_slids(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardResponse>> {
    Ok(Json(dashboard(&state, &query.creator).await?))
}

async fn get_slid(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> AppResult<Json<Slid>> {
    Ok(Json(load_slid(&state, &short_id).await?))
}

async fn share_slid(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> AppResult<Json<ShareResponse>> {
    let slid = load_slid(&state, &short_id).await?;
    Ok(Json(share(&state, slid)))
}

async fn receipt(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> AppResult<Json<ReceiptResponse>> {
    let slid = load_slid(&state, &short_id).await?;
    let explorer_url = slid.tx_hash.as_deref().map(explorer_tx_url);
    let receipt_url = links::receipt_url(&state.config.server.app_url, &slid.short_id);
    Ok(Json(ReceiptResponse { slid, receipt_url, explorer_url }))
}
