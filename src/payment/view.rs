use serde::Serialize;

use super::chain::explorer_tx_url;
use super::flow::{PaymentPhase, SWIPE_END_PX, SWIPE_THRESHOLD_PX};
use crate::models::{Slid, SlidStatus};

pub const SWIPE_LABEL: &str = "Swipe to Pay";

/// What the payment page shows below the invoice card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum PaymentPanel {
    /// Terminal; the swipe control is never offered again
    Paid {
        tx_hash: Option<String>,
        explorer_url: Option<String>,
    },
    /// Status other than pending or paid
    Unavailable { status: SlidStatus },
    /// A transaction hash for this invoice is being confirmed
    Processing,
    /// Scope or terms must be accepted first
    AgreementRequired,
    Swipe {
        label: &'static str,
        threshold_px: f64,
        end_px: f64,
    },
}

impl PaymentPanel {
    pub fn shows_swipe(&self) -> bool {
        matches!(self, PaymentPanel::Swipe { .. })
    }
}

pub fn payment_panel(slid: &Slid, agreed: bool, phase: &PaymentPhase) -> PaymentPanel {
    if slid.status == SlidStatus::Paid {
        return PaymentPanel::Paid {
            tx_hash: slid.tx_hash.clone(),
            explorer_url: slid.tx_hash.as_deref().map(explorer_tx_url),
        };
    }
    if let PaymentPhase::Paid { tx_hash } = phase {
        return PaymentPanel::Paid {
            tx_hash: Some(tx_hash.clone()),
            explorer_url: Some(explorer_tx_url(tx_hash)),
        };
    }
    if !slid.is_payable() {
        return PaymentPanel::Unavailable { status: slid.status };
    }
    // A swipe that has not reported a hash yet belongs to another session and
    // may never come back, so it does not hide the control
    if let PaymentPhase::Confirming { .. } = phase {
        return PaymentPanel::Processing;
    }
    if slid.requires_agreement() && !agreed {
        return PaymentPanel::AgreementRequired;
    }
    PaymentPanel::Swipe {
        label: SWIPE_LABEL,
        threshold_px: SWIPE_THRESHOLD_PX,
        end_px: SWIPE_END_PX,
    }
}
