use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::SlidStore;
use crate::models::{NewSlid, PaidUpdate, Slid, SlidStatus};
use crate::types::{AppError, AppResult};

// Note: runtime query_as keeps the build independent of DATABASE_URL
#[derive(Debug, sqlx::FromRow)]
struct SlidRow {
    id: Uuid,
    short_id: String,
    creator_address: String,
    client_name: String,
    client_email: Option<String>,
    client_address: Option<String>,
    amount: Decimal,
    currency: String,
    description: String,
    scope: Option<String>,
    terms: Option<String>,
    status: String,
    tx_hash: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SlidRow> for Slid {
    type Error = AppError;

    fn try_from(row: SlidRow) -> AppResult<Self> {
        let status: SlidStatus = row.status.parse().map_err(AppError::Internal)?;
        Ok(Slid {
            id: row.id,
            short_id: row.short_id,
            creator_address: row.creator_address,
            client_name: row.client_name,
            client_email: row.client_email,
            client_address: row.client_address,
            amount: row.amount,
            currency: row.currency,
            description: row.description,
            scope: row.scope,
            terms: row.terms,
            status,
            tx_hash: row.tx_hash,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SLID_COLUMNS: &str = "id, short_id, creator_address, client_name, client_email, client_address, \
     amount, currency, description, scope, terms, status, tx_hash, paid_at, created_at, updated_at";

/// Postgres-backed store over the `slids` table
#[derive(Clone)]
pub struct PgSlidStore {
    pool: PgPool,
}

impl PgSlidStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlidStore for PgSlidStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, slid: NewSlid) -> AppResult<Slid> {
        let sql = format!(
            r#"
            INSERT INTO slids (short_id, creator_address, client_name, client_email, amount,
                               currency, description, scope, terms, status)
            VALUES ($1, $2, $3, $4, $5, 'USDC', $6, $7, $8, $9)
            RETURNING {}
            "#,
            SLID_COLUMNS
        );

        let row = sqlx::query_as::<_, SlidRow>(&sql)
            .bind(&slid.short_id)
            .bind(&slid.creator_address)
            .bind(&slid.client_name)
            .bind(&slid.client_email)
            .bind(slid.amount)
            .bind(&slid.description)
            .bind(&slid.scope)
            .bind(&slid.terms)
            .bind(slid.status.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn get_by_short_id(&self, short_id: &str) -> AppResult<Option<Slid>> {
        let sql = format!("SELECT {} FROM slids WHERE short_id = $1", SLID_COLUMNS);

        let row = sqlx::query_as::<_, SlidRow>(&sql)
            .bind(short_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Slid::try_from).transpose()
    }

    async fn list_by_creator(&self, creator_address: &str) -> AppResult<Vec<Slid>> {
        let sql = format!(
            r#"
            SELECT {} FROM slids
            WHERE creator_address = $1
            ORDER BY created_at DESC
            "#,
            SLID_COLUMNS
        );

        let rows = sqlx::query_as::<_, SlidRow>(&sql)
            .bind(creator_address.to_lowercase())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Slid::try_from).collect()
    }

    async fn mark_paid(&self, short_id: &str, update: PaidUpdate) -> AppResult<Option<Slid>> {
        let sql = format!(
            r#"
            UPDATE slids
            SET status = 'paid', tx_hash = $2, paid_at = $3, client_address = $4, updated_at = NOW()
            WHERE short_id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            SLID_COLUMNS
        );

        let row = sqlx::query_as::<_, SlidRow>(&sql)
            .bind(short_id)
            .bind(&update.tx_hash)
            .bind(update.paid_at)
            .bind(update.client_address.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Slid::try_from).transpose()
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
