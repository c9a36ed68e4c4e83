//! Payment confirmation.
//!
//! Turns a swipe into a transfer request for the wallet, then turns the
//! wallet's transaction hash into a verified `pending -> paid` transition.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::chain::{verify_transfer, wait_for_receipt, ChainClient};
use super::flow::{PaymentPhase, SwipeOutcome};
use super::tracker::PaymentTracker;
use super::usdc::{
    format_address, format_tx_hash, parse_address, parse_tx_hash, to_token_units, TransferRequest,
};
use super::view::{payment_panel, PaymentPanel};
use crate::config::ChainConfig;
use crate::db::SlidStore;
use crate::models::{PaidUpdate, Slid, SlidStatus};
use crate::types::{AppError, AppResult};
use crate::utils::is_short_id;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub offset_px: f64,
    #[serde(default)]
    pub agreed: bool,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    #[serde(flatten)]
    pub outcome: SwipeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub slid: Slid,
    pub phase: PaymentPhase,
    #[serde(flatten)]
    pub panel: PaymentPanel,
}

pub struct PaymentService {
    settlement: Settlement,
    tracker: PaymentTracker,
    chain_id: u64,
}

/// Everything a confirmation task needs, cloned into it
#[derive(Clone)]
struct Settlement {
    store: Arc<dyn SlidStore>,
    chain: Arc<dyn ChainClient>,
    token: Address,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn SlidStore>,
        chain: Arc<dyn ChainClient>,
        config: &ChainConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            settlement: Settlement {
                store,
                chain,
                token: parse_address(&config.usdc_address)?,
                poll_interval: Duration::from_millis(config.receipt_poll_interval_ms.max(1)),
                timeout: (config.confirmation_timeout_secs > 0)
                    .then(|| Duration::from_secs(config.confirmation_timeout_secs)),
            },
            tracker: PaymentTracker::new()
                .with_submission_lease(Duration::from_millis(config.submission_timeout_ms)),
            chain_id: config.chain_id,
        })
    }

    pub fn tracker(&self) -> &PaymentTracker {
        &self.tracker
    }

    async fn load(&self, short_id: &str) -> AppResult<Slid> {
        if !is_short_id(short_id) {
            return Err(AppError::NotFound(format!("invoice {}", short_id)));
        }
        self.settlement.load(short_id).await
    }

    pub async fn view(&self, short_id: &str, agreed: bool) -> AppResult<PaymentView> {
        let slid = self.load(short_id).await?;
        let phase = match (&slid.status, &slid.tx_hash) {
            (SlidStatus::Paid, Some(tx_hash)) => PaymentPhase::Paid { tx_hash: tx_hash.clone() },
            _ => self.tracker.phase(short_id).await,
        };
        let panel = payment_panel(&slid, agreed, &phase);
        Ok(PaymentView { slid, phase, panel })
    }

    /// Release of the swipe control at `offset_px`
    pub async fn swipe(&self, short_id: &str, request: &SwipeRequest) -> AppResult<SwipeResponse> {
        let slid = self.load(short_id).await?;
        if slid.status == SlidStatus::Paid {
            return Err(AppError::Conflict(format!("invoice {} is already paid", short_id)));
        }
        if !slid.is_payable() {
            return Err(AppError::Conflict(format!("invoice {} is {}", short_id, slid.status)));
        }
        if slid.requires_agreement() && !request.agreed {
            return Err(AppError::InvalidRequest(
                "Please agree to the scope of work and terms to continue".to_string(),
            ));
        }

        // Built before the phase changes so a bad amount leaves the flow idle
        let transfer = TransferRequest::new(self.chain_id, self.settlement.token, &slid.creator_address, slid.amount)?;

        let outcome = self.tracker.swipe(short_id, request.offset_px).await?;
        match outcome {
            SwipeOutcome::Submit { .. } => {
                info!(short_id, amount_units = %transfer.amount_units, "Swipe crossed threshold, submitting transfer");
                Ok(SwipeResponse { outcome, transfer: Some(transfer) })
            }
            SwipeOutcome::SpringBack { .. } => Ok(SwipeResponse { outcome, transfer: None }),
        }
    }

    /// The wallet failed or the payer gave up; the control becomes available
    /// again and any running confirmation is cancelled
    pub async fn abort(&self, short_id: &str) -> AppResult<PaymentPhase> {
        self.load(short_id).await?;
        self.tracker.fail(short_id).await?;
        warn!(short_id, "Payment aborted");
        Ok(self.tracker.phase(short_id).await)
    }

    /// Wait for `tx_hash` to be mined, verify it paid this invoice, then mark it paid.
    ///
    /// The wait runs in its own task, so the phase is settled even when the
    /// caller goes away. Calling again with the same or a newer hash replaces
    /// the running wait; an already-recorded payment is returned as is.
    pub async fn confirm(&self, short_id: &str, tx_hash: &str) -> AppResult<Slid> {
        let slid = self.load(short_id).await?;
        let hash = parse_tx_hash(tx_hash)?;
        let tx_hash = format_tx_hash(&hash);

        if slid.status == SlidStatus::Paid {
            if !paid_with(&slid, &tx_hash) {
                return Err(AppError::Conflict(format!("invoice {} is already paid", short_id)));
            }
            self.tracker.clear(short_id).await;
            return Ok(slid);
        }
        if !slid.is_payable() {
            return Err(AppError::Conflict(format!("invoice {} is {}", short_id, slid.status)));
        }

        self.tracker.begin_confirming(short_id, &tx_hash).await?;
        info!(short_id, tx_hash = %tx_hash, "Waiting for transfer confirmation");

        let task = {
            let settlement = self.settlement.clone();
            let tracker = self.tracker.clone();
            let tx_hash = tx_hash.clone();
            tokio::spawn(async move {
                let result = settlement.settle(&slid, hash).await;
                match &result {
                    Ok(_) => {
                        tracker.confirmed(&slid.short_id, &tx_hash).await;
                        info!(short_id = %slid.short_id, tx_hash = %tx_hash, "Invoice paid");
                    }
                    Err(e) => {
                        warn!(short_id = %slid.short_id, tx_hash = %tx_hash, error = %e, "Payment confirmation failed");
                        tracker.fail_confirming(&slid.short_id, &tx_hash).await;
                    }
                }
                result
            })
        };
        self.tracker.attach(short_id, &tx_hash, task.abort_handle()).await;

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AppError::Conflict(format!(
                "confirmation of {} for invoice {} was replaced or aborted",
                tx_hash, short_id
            ))),
            Err(e) => {
                self.tracker.fail_confirming(short_id, &tx_hash).await;
                Err(AppError::Internal(format!("confirmation task failed: {}", e)))
            }
        }
    }
}

impl Settlement {
    async fn load(&self, short_id: &str) -> AppResult<Slid> {
        self.store
            .get_by_short_id(short_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invoice {}", short_id)))
    }

    async fn settle(&self, slid: &Slid, hash: H256) -> AppResult<Slid> {
        let recipient = parse_address(&slid.creator_address)?;
        let expected = to_token_units(slid.amount)?;

        let receipt = wait_for_receipt(self.chain.as_ref(), hash, self.poll_interval, self.timeout).await?;
        let payer = verify_transfer(&receipt, self.token, recipient, expected)?;

        let update = PaidUpdate {
            tx_hash: format_tx_hash(&hash),
            client_address: format_address(&payer),
            paid_at: Utc::now(),
        };

        if let Some(paid) = self.store.mark_paid(&slid.short_id, update).await? {
            return Ok(paid);
        }

        // A replaced wait for the same hash may have recorded it first
        let current = self.load(&slid.short_id).await?;
        if paid_with(&current, &format_tx_hash(&hash)) {
            Ok(current)
        } else {
            Err(AppError::Conflict(format!(
                "invoice {} was settled by another payment",
                slid.short_id
            )))
        }
    }
}

fn paid_with(slid: &Slid, tx_hash: &str) -> bool {
    slid.status == SlidStatus::Paid
        && slid
            .tx_hash
            .as_deref()
            .map(|stored| stored.eq_ignore_ascii_case(tx_hash))
            .unwrap_or(false)
}
