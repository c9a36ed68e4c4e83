//! Static assets (logo, Open Graph image) referenced by the pages and the
//! Farcaster manifest.

use axum::Router;
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tracing::{info, warn};

fn public_dir() -> PathBuf {
    let paths = [
        PathBuf::from("public"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
    ];

    for path in paths {
        if path.is_dir() {
            info!(path = %path.display(), "Serving static assets");
            return path;
        }
    }

    warn!("Static assets directory not found, logo and preview image will 404");
    PathBuf::from("public")
}

/// Fallback service; every route registered elsewhere takes precedence
pub fn router() -> Router {
    Router::new().fallback_service(ServeDir::new(public_dir()))
}
