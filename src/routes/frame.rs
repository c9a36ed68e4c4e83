//! Farcaster mini-app surface
//!
//! - `GET /.well-known/farcaster.json` - static manifest
//! - `POST /api/webhook` - frame events (added/removed, notifications), logged only

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/.well-known/farcaster.json", get(manifest))
        .route("/api/webhook", post(webhook))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameManifest {
    pub account_association: AccountAssociation,
    pub frame: FrameDescriptor,
}

#[derive(Debug, Serialize)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescriptor {
    pub version: String,
    pub name: String,
    pub icon_url: String,
    pub home_url: String,
    pub image_url: String,
    pub button_title: String,
    pub splash_image_url: String,
    pub splash_background_color: String,
    pub webhook_url: String,
}

impl FrameManifest {
    pub fn from_config(config: &Config) -> Self {
        let app_url = &config.server.app_url;
        Self {
            account_association: AccountAssociation {
                header: config.frame.header.clone(),
                payload: config.frame.payload.clone(),
                signature: config.frame.signature.clone(),
            },
            frame: FrameDescriptor {
                version: "1".to_string(),
                name: "Slid".to_string(),
                icon_url: format!("{}/logo-polished.png", app_url),
                home_url: app_url.clone(),
                image_url: format!("{}/og-image.png", app_url),
                button_title: "Open Slid".to_string(),
                splash_image_url: format!("{}/logo-polished.png", app_url),
                splash_background_color: "#0A0A0B".to_string(),
                webhook_url: format!("{}/api/webhook", app_url),
            },
        }
    }
}

async fn manifest(State(state): State<AppState>) -> Json<FrameManifest> {
    Json(FrameManifest::from_config(&state.config))
}

async fn webhook(body: Bytes) -> Response {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(event) => {
            let kind = event
                .get("event")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            info!(event = kind, payload = %event, "Farcaster webhook");
            (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response()
        }
        Err(e) => {
            warn!("Webhook error: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid request" })),
            )
                .into_response()
        }
    }
}
