// Slid - shareable USDC invoices with swipe-to-pay on Base

pub mod assist;
pub mod config;
pub mod db;
pub mod links;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
