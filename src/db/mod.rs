//! Record store for invoice rows.
//!
//! Every view performs a single filtered read or a single write against the
//! `slids` table; the trait keeps handlers independent of the backend so the
//! service can run on Postgres or fully in memory.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use crate::config::DatabaseConfig;
use crate::models::{NewSlid, PaidUpdate, Slid};
use crate::types::AppResult;
use anyhow::Result;

pub use memory::*;
pub use operations::*;

pub mod memory;
pub mod operations;

#[async_trait]
pub trait SlidStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn insert(&self, slid: NewSlid) -> AppResult<Slid>;

    async fn get_by_short_id(&self, short_id: &str) -> AppResult<Option<Slid>>;

    /// All rows for a creator, newest first
    async fn list_by_creator(&self, creator_address: &str) -> AppResult<Vec<Slid>>;

    /// Apply the `pending -> paid` transition.
    ///
    /// Returns `None` when no pending row matched, leaving any existing
    /// payment untouched.
    async fn mark_paid(&self, short_id: &str, update: PaidUpdate) -> AppResult<Option<Slid>>;

    async fn ping(&self) -> AppResult<()>;
}

pub async fn create_pool(config: &DatabaseConfig, url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(url)
        .await?;

    // Test connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await?;

    Ok(pool)
}
