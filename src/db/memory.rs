use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::SlidStore;
use crate::models::{NewSlid, PaidUpdate, Slid, SlidStatus};
use crate::types::{AppError, AppResult};

/// In-process store used when no database is configured, and by tests
#[derive(Clone, Default)]
pub struct MemorySlidStore {
    inner: Arc<RwLock<HashMap<String, Slid>>>,
}

impl MemorySlidStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl SlidStore for MemorySlidStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, slid: NewSlid) -> AppResult<Slid> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(&slid.short_id) {
            return Err(AppError::Conflict(format!("short_id {} already exists", slid.short_id)));
        }

        let now = Utc::now();
        let row = Slid {
            id: uuid::Uuid::new_v4(),
            short_id: slid.short_id,
            creator_address: slid.creator_address,
            client_name: slid.client_name,
            client_email: slid.client_email,
            client_address: None,
            amount: slid.amount,
            currency: "USDC".to_string(),
            description: slid.description,
            scope: slid.scope,
            terms: slid.terms,
            status: slid.status,
            tx_hash: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        guard.insert(row.short_id.clone(), row.clone());
        Ok(row)
    }

    async fn get_by_short_id(&self, short_id: &str) -> AppResult<Option<Slid>> {
        let guard = self.inner.read().await;
        Ok(guard.get(short_id).cloned())
    }

    async fn list_by_creator(&self, creator_address: &str) -> AppResult<Vec<Slid>> {
        let creator = creator_address.to_lowercase();
        let guard = self.inner.read().await;
        let mut rows: Vec<Slid> = guard
            .values()
            .filter(|s| s.creator_address == creator)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_paid(&self, short_id: &str, update: PaidUpdate) -> AppResult<Option<Slid>> {
        let mut guard = self.inner.write().await;
        match guard.get_mut(short_id) {
            Some(slid) if slid.status == SlidStatus::Pending => {
                slid.status = SlidStatus::Paid;
                slid.tx_hash = Some(update.tx_hash);
                slid.paid_at = Some(update.paid_at);
                slid.client_address = Some(update.client_address.to_lowercase());
                slid.updated_at = Utc::now();
                Ok(Some(slid.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
