//! HTTP Routes
//!
//! - `/api/slids` - invoice creation, lookup, dashboard, share and receipt data
//! - `/api/slids/{short_id}/{payment,swipe,abort,confirm}` - swipe-to-pay
//! - `/api/ai/generate` - text assist
//! - `/api/health` - health check
//! - `/.well-known/farcaster.json`, `/api/webhook` - Farcaster mini-app
//! - `/`, `/dashboard`, `/p/{short_id}`, `/receipt/{short_id}` - pages
//! - everything else falls through to `public/`

pub mod ai;
pub mod frame;
pub mod health;
pub mod pages;
pub mod payments;
pub mod slids;
pub mod static_files;

use axum::Router;
use tracing::info;

use crate::middleware::{apply_cors, apply_trace};
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let api_router = Router::new()
        .merge(slids::router(state.clone()))
        .merge(payments::router(state.clone()))
        .merge(ai::router(state.clone()))
        .merge(frame::router(state.clone()))
        .merge(health::router(state.clone()));
    let api_router = apply_cors(api_router, &state.config.server.cors_allowed_origins);

    let app = Router::new()
        .merge(api_router)
        .merge(pages::router(state))
        .merge(static_files::router());

    apply_trace(app)
}
