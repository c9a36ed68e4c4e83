use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::AbortHandle;

use super::flow::{FlowError, PaymentFlow, PaymentPhase, SwipeOutcome};

/// How long a swipe holds an invoice before another session may swipe again
pub const DEFAULT_SUBMISSION_LEASE: Duration = Duration::from_secs(120);

struct TrackedFlow {
    flow: PaymentFlow,
    /// Confirmation task for the hash in `Confirming`
    task: Option<AbortHandle>,
}

impl TrackedFlow {
    fn new() -> Self {
        Self { flow: PaymentFlow::new(), task: None }
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// In-flight payment phase per invoice short id, shared across requests.
///
/// Only invoices with a swipe or confirmation in progress have an entry;
/// idle and paid invoices are dropped from the map.
#[derive(Clone)]
pub struct PaymentTracker {
    inner: Arc<RwLock<HashMap<String, TrackedFlow>>>,
    submission_lease: Duration,
}

impl Default for PaymentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            submission_lease: DEFAULT_SUBMISSION_LEASE,
        }
    }

    pub fn with_submission_lease(mut self, lease: Duration) -> Self {
        self.submission_lease = lease;
        self
    }

    pub async fn phase(&self, short_id: &str) -> PaymentPhase {
        let guard = self.inner.read().await;
        match guard.get(short_id) {
            Some(tracked) if !tracked.flow.is_stale(Instant::now(), self.submission_lease) => {
                tracked.flow.phase().clone()
            }
            _ => PaymentPhase::Idle,
        }
    }

    /// Number of invoices with a payment in progress
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Drag to `offset_px` and let go in one step
    pub async fn swipe(&self, short_id: &str, offset_px: f64) -> Result<SwipeOutcome, FlowError> {
        let mut guard = self.inner.write().await;
        let tracked = guard.entry(short_id.to_string()).or_insert_with(TrackedFlow::new);
        if tracked.flow.is_stale(Instant::now(), self.submission_lease) {
            tracked.flow = PaymentFlow::new();
        }

        tracked.flow.drag(offset_px)?;
        let outcome = tracked.flow.release()?;
        if let SwipeOutcome::SpringBack { .. } = outcome {
            guard.remove(short_id);
        }
        Ok(outcome)
    }

    /// Move to `Confirming { tx_hash }`, cancelling the task of any hash it replaces
    pub async fn begin_confirming(&self, short_id: &str, tx_hash: &str) -> Result<(), FlowError> {
        let mut guard = self.inner.write().await;
        let tracked = guard.entry(short_id.to_string()).or_insert_with(TrackedFlow::new);
        tracked.flow.submitted(tx_hash)?;
        tracked.cancel_task();
        Ok(())
    }

    /// Hand over the task confirming `tx_hash`. A hash that was already
    /// replaced or aborted gets its task cancelled instead.
    pub async fn attach(&self, short_id: &str, tx_hash: &str, task: AbortHandle) {
        let mut guard = self.inner.write().await;
        match guard.get_mut(short_id) {
            Some(tracked) if tracked.flow.phase().is_confirming(tx_hash) => {
                tracked.cancel_task();
                tracked.task = Some(task);
            }
            _ => task.abort(),
        }
    }

    /// `tx_hash` settled the invoice; the stored status is authoritative from here
    pub async fn confirmed(&self, short_id: &str, tx_hash: &str) {
        let mut guard = self.inner.write().await;
        let settled = match guard.get_mut(short_id) {
            Some(tracked) if tracked.flow.phase().is_confirming(tx_hash) => tracked.flow.confirmed().is_ok(),
            _ => false,
        };
        if settled {
            guard.remove(short_id);
        }
    }

    /// Confirmation of `tx_hash` failed; a newer hash for the invoice is left alone
    pub async fn fail_confirming(&self, short_id: &str, tx_hash: &str) {
        let mut guard = self.inner.write().await;
        let matches = guard
            .get(short_id)
            .map(|tracked| tracked.flow.phase().is_confirming(tx_hash))
            .unwrap_or(false);
        if matches {
            guard.remove(short_id);
        }
    }

    /// Drop whatever is in progress for the invoice, including a running confirmation
    pub async fn fail(&self, short_id: &str) -> Result<(), FlowError> {
        let mut guard = self.inner.write().await;
        if let Some(tracked) = guard.get_mut(short_id) {
            tracked.flow.fail()?;
            tracked.cancel_task();
        }
        guard.remove(short_id);
        Ok(())
    }

    /// Forget the invoice without touching its task, used once it is stored as paid
    pub async fn clear(&self, short_id: &str) {
        self.inner.write().await.remove(short_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_invoice_is_idle() {
        let tracker = PaymentTracker::new();
        assert_eq!(tracker.phase("nothing1").await, PaymentPhase::Idle);
        tracker.fail("nothing1").await.unwrap();
        assert_eq!(tracker.len().await, 0);
    }

    #[tokio::test]
    async fn test_flows_are_per_invoice() {
        let tracker = PaymentTracker::new();
        tracker.swipe("aaaaaaaa", 200.0).await.unwrap();
        assert_eq!(tracker.phase("aaaaaaaa").await, PaymentPhase::Submitting);
        assert_eq!(tracker.phase("bbbbbbbb").await, PaymentPhase::Idle);

        // a second swipe on the same invoice is rejected while submitting
        assert!(tracker.swipe("aaaaaaaa", 200.0).await.is_err());
        assert!(tracker.swipe("bbbbbbbb", 200.0).await.is_ok());
    }

    #[tokio::test]
    async fn test_unanswered_submission_expires() {
        let tracker = PaymentTracker::new().with_submission_lease(Duration::from_millis(5));
        tracker.swipe("aaaaaaaa", 200.0).await.unwrap();
        assert!(tracker.swipe("aaaaaaaa", 200.0).await.is_err());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(tracker.phase("aaaaaaaa").await, PaymentPhase::Idle);
        assert!(matches!(
            tracker.swipe("aaaaaaaa", 200.0).await.unwrap(),
            SwipeOutcome::Submit { .. }
        ));
    }

    #[tokio::test]
    async fn test_finished_flows_are_dropped() {
        let tracker = PaymentTracker::new();

        tracker.swipe("aaaaaaaa", 90.0).await.unwrap();
        assert_eq!(tracker.len().await, 0);

        tracker.swipe("aaaaaaaa", 200.0).await.unwrap();
        tracker.fail("aaaaaaaa").await.unwrap();
        assert_eq!(tracker.len().await, 0);

        tracker.swipe("bbbbbbbb", 200.0).await.unwrap();
        tracker.begin_confirming("bbbbbbbb", "0x01").await.unwrap();
        tracker.fail_confirming("bbbbbbbb", "0x01").await;
        assert_eq!(tracker.len().await, 0);

        tracker.begin_confirming("cccccccc", "0x02").await.unwrap();
        tracker.confirmed("cccccccc", "0x02").await;
        assert_eq!(tracker.len().await, 0);
        assert_eq!(tracker.phase("cccccccc").await, PaymentPhase::Idle);
    }

    #[tokio::test]
    async fn test_reports_for_replaced_hash_are_ignored() {
        let tracker = PaymentTracker::new();
        tracker.begin_confirming("aaaaaaaa", "0x01").await.unwrap();
        tracker.begin_confirming("aaaaaaaa", "0x02").await.unwrap();

        tracker.fail_confirming("aaaaaaaa", "0x01").await;
        tracker.confirmed("aaaaaaaa", "0x01").await;
        assert_eq!(
            tracker.phase("aaaaaaaa").await,
            PaymentPhase::Confirming { tx_hash: "0x02".to_string() }
        );
    }

    #[tokio::test]
    async fn test_replacing_a_hash_cancels_its_task() {
        let tracker = PaymentTracker::new();
        tracker.begin_confirming("aaaaaaaa", "0x01").await.unwrap();
        let stale = tokio::spawn(std::future::pending::<()>());
        tracker.attach("aaaaaaaa", "0x01", stale.abort_handle()).await;

        tracker.begin_confirming("aaaaaaaa", "0x02").await.unwrap();
        assert!(stale.await.unwrap_err().is_cancelled());

        // a task for a hash that is no longer current is cancelled on arrival
        let late = tokio::spawn(std::future::pending::<()>());
        tracker.attach("aaaaaaaa", "0x01", late.abort_handle()).await;
        assert!(late.await.unwrap_err().is_cancelled());

        let current = tokio::spawn(std::future::pending::<()>());
        tracker.attach("aaaaaaaa", "0x02", current.abort_handle()).await;
        tracker.fail("aaaaaaaa").await.unwrap();
        assert!(current.await.unwrap_err().is_cancelled());
        assert_eq!(tracker.len().await, 0);
    }
}
