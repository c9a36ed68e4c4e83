//! Swipe-to-pay phases.
//!
//! ```text
//! idle -> dragging -> submitting -> confirming -> paid
//!           |             |             |
//!           +-> idle      +-> idle      +-> idle
//! ```
//!
//! A drag that stops short of [`SWIPE_THRESHOLD_PX`] springs back to idle.
//! Crossing it moves the control to [`SWIPE_END_PX`] and starts submission.
//! Any failure while submitting or confirming drops back to idle; `paid` is
//! terminal. A submission the wallet never reports back on expires after a
//! lease, and a new hash for the same invoice replaces one being confirmed.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::types::AppError;

pub const SWIPE_THRESHOLD_PX: f64 = 180.0;
pub const SWIPE_END_PX: f64 = 220.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PaymentPhase {
    Idle,
    Dragging { offset_px: f64 },
    Submitting,
    Confirming { tx_hash: String },
    Paid { tx_hash: String },
}

impl PaymentPhase {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentPhase::Idle => "idle",
            PaymentPhase::Dragging { .. } => "dragging",
            PaymentPhase::Submitting => "submitting",
            PaymentPhase::Confirming { .. } => "confirming",
            PaymentPhase::Paid { .. } => "paid",
        }
    }

    pub fn is_confirming(&self, hash: &str) -> bool {
        matches!(self, PaymentPhase::Confirming { tx_hash } if tx_hash == hash)
    }
}

/// Result of letting go of the swipe control
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// Animate to the end position and submit the transfer
    Submit { position_px: f64 },
    /// Animate back to the start
    SpringBack { position_px: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("cannot {action} while {phase}")]
pub struct FlowError {
    pub action: &'static str,
    pub phase: &'static str,
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFlow {
    phase: PaymentPhase,
    since: Instant,
}

impl Default for PaymentFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentFlow {
    pub fn new() -> Self {
        Self { phase: PaymentPhase::Idle, since: Instant::now() }
    }

    pub fn phase(&self) -> &PaymentPhase {
        &self.phase
    }

    fn enter(&mut self, phase: PaymentPhase) {
        self.phase = phase;
        self.since = Instant::now();
    }

    /// Submitting for at least `lease` as of `now`
    pub fn is_stale(&self, now: Instant, lease: Duration) -> bool {
        self.phase == PaymentPhase::Submitting && now.saturating_duration_since(self.since) >= lease
    }

    fn reject(&self, action: &'static str) -> FlowError {
        FlowError { action, phase: self.phase.name() }
    }

    /// Move the control; offsets are clamped to the track
    pub fn drag(&mut self, offset_px: f64) -> Result<(), FlowError> {
        match self.phase {
            PaymentPhase::Idle | PaymentPhase::Dragging { .. } => {
                let offset_px = if offset_px.is_finite() {
                    offset_px.clamp(0.0, SWIPE_END_PX)
                } else {
                    0.0
                };
                self.enter(PaymentPhase::Dragging { offset_px });
                Ok(())
            }
            _ => Err(self.reject("drag")),
        }
    }

    pub fn release(&mut self) -> Result<SwipeOutcome, FlowError> {
        match self.phase {
            PaymentPhase::Dragging { offset_px } if offset_px > SWIPE_THRESHOLD_PX => {
                self.enter(PaymentPhase::Submitting);
                Ok(SwipeOutcome::Submit { position_px: SWIPE_END_PX })
            }
            PaymentPhase::Dragging { .. } => {
                self.enter(PaymentPhase::Idle);
                Ok(SwipeOutcome::SpringBack { position_px: 0.0 })
            }
            _ => Err(self.reject("release")),
        }
    }

    /// The wallet returned a transaction hash.
    ///
    /// Accepted from idle too, so a transfer whose confirmation was lost can
    /// be confirmed again, and while confirming, where the newer hash wins.
    pub fn submitted(&mut self, tx_hash: impl Into<String>) -> Result<(), FlowError> {
        match self.phase {
            PaymentPhase::Idle | PaymentPhase::Submitting | PaymentPhase::Confirming { .. } => {
                self.enter(PaymentPhase::Confirming { tx_hash: tx_hash.into() });
                Ok(())
            }
            _ => Err(self.reject("confirm")),
        }
    }

    pub fn confirmed(&mut self) -> Result<(), FlowError> {
        match &self.phase {
            PaymentPhase::Confirming { tx_hash } => {
                let tx_hash = tx_hash.clone();
                self.enter(PaymentPhase::Paid { tx_hash });
                Ok(())
            }
            _ => Err(self.reject("settle")),
        }
    }

    /// Submission or confirmation failed
    pub fn fail(&mut self) -> Result<(), FlowError> {
        match self.phase {
            PaymentPhase::Paid { .. } => Err(self.reject("reset")),
            _ => {
                self.enter(PaymentPhase::Idle);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_drag_springs_back() {
        let mut flow = PaymentFlow::new();
        flow.drag(120.0).unwrap();
        assert_eq!(flow.release().unwrap(), SwipeOutcome::SpringBack { position_px: 0.0 });
        assert_eq!(flow.phase(), &PaymentPhase::Idle);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut flow = PaymentFlow::new();
        flow.drag(SWIPE_THRESHOLD_PX).unwrap();
        assert!(matches!(flow.release().unwrap(), SwipeOutcome::SpringBack { .. }));

        flow.drag(181.0).unwrap();
        assert_eq!(flow.release().unwrap(), SwipeOutcome::Submit { position_px: SWIPE_END_PX });
        assert_eq!(flow.phase(), &PaymentPhase::Submitting);
    }

    #[test]
    fn test_drag_is_clamped() {
        let mut flow = PaymentFlow::new();
        flow.drag(10_000.0).unwrap();
        assert_eq!(flow.phase(), &PaymentPhase::Dragging { offset_px: SWIPE_END_PX });
        flow.drag(-5.0).unwrap();
        assert_eq!(flow.phase(), &PaymentPhase::Dragging { offset_px: 0.0 });
        flow.drag(f64::NAN).unwrap();
        assert_eq!(flow.phase(), &PaymentPhase::Dragging { offset_px: 0.0 });
    }

    #[test]
    fn test_full_path_to_paid() {
        let mut flow = PaymentFlow::new();
        flow.drag(200.0).unwrap();
        flow.release().unwrap();
        flow.submitted("0xabc").unwrap();
        assert!(flow.phase().is_confirming("0xabc"));
        flow.confirmed().unwrap();
        assert_eq!(flow.phase(), &PaymentPhase::Paid { tx_hash: "0xabc".to_string() });

        assert!(flow.drag(200.0).is_err());
        assert!(flow.fail().is_err());
    }

    #[test]
    fn test_failure_resets_to_idle() {
        let mut flow = PaymentFlow::new();
        flow.drag(200.0).unwrap();
        flow.release().unwrap();
        flow.fail().unwrap();
        assert_eq!(flow.phase(), &PaymentPhase::Idle);

        flow.submitted("0xdef").unwrap();
        flow.fail().unwrap();
        assert_eq!(flow.phase(), &PaymentPhase::Idle);
    }

    #[test]
    fn test_newer_hash_replaces_confirming() {
        let mut flow = PaymentFlow::new();
        flow.submitted("0x1").unwrap();
        flow.submitted("0x2").unwrap();
        assert!(flow.phase().is_confirming("0x2"));
        assert!(!flow.phase().is_confirming("0x1"));
        assert!(flow.drag(190.0).is_err());
    }

    #[test]
    fn test_submission_goes_stale_after_lease() {
        let lease = Duration::from_secs(60);
        let mut flow = PaymentFlow::new();
        flow.drag(200.0).unwrap();
        flow.release().unwrap();

        let now = Instant::now();
        assert!(!flow.is_stale(now, lease));
        assert!(flow.is_stale(now + lease, lease));

        // only an unanswered submission expires
        flow.submitted("0x1").unwrap();
        assert!(!flow.is_stale(now + lease * 10, lease));
    }

    #[test]
    fn test_paid_flow_is_terminal() {
        let mut flow = PaymentFlow::new();
        flow.submitted("0xfeed").unwrap();
        flow.confirmed().unwrap();
        assert!(flow.drag(1.0).is_err());
        assert!(flow.submitted("0x2").is_err());
    }
}
