//! Cancellable handles for spawned fetches.
//!
//! A spawned fetch owns a delivery slot holding the caller's callback.
//! Whoever takes the callback out of the slot first wins: the task (which
//! then delivers) or [`FetchHandle::cancel`] (which guarantees nothing is
//! ever delivered). The slot lock is the single linearization point, so
//! exactly one of the two happens.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::error::FetchOutcome;

pub(crate) type Deliver = Box<dyn FnOnce(FetchOutcome) + Send>;
pub(crate) type DeliverySlot = Arc<Mutex<Option<Deliver>>>;

/// Handle to one in-flight fetch.
///
/// Dropping the handle cancels the fetch. Keep it alive for as long as the
/// outcome is wanted.
pub struct FetchHandle {
    id: u64,
    task: JoinHandle<()>,
    delivery: DeliverySlot,
}

impl FetchHandle {
    pub(crate) fn new(id: u64, task: JoinHandle<()>, delivery: DeliverySlot) -> Self {
        Self { id, task, delivery }
    }

    /// Identifier used in this fetch's log events.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel the fetch.
    ///
    /// Aborts the task, which drops the in-flight HTTP request and its
    /// connection. Returns `true` if the outcome had not been delivered yet;
    /// in that case it never will be.
    pub fn cancel(&self) -> bool {
        let pending = self.delivery.lock().take().is_some();
        self.task.abort();
        if pending {
            debug!(fetch_id = self.id, "Fetch cancelled");
        }
        pending
    }

    /// Returns true while the outcome is neither delivered nor cancelled.
    pub fn is_pending(&self) -> bool {
        self.delivery.lock().is_some()
    }

    /// Returns true once the underlying task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// A spawned fetch whose outcome is awaited by the caller.
///
/// The awaiting task is the delivery context: the outcome is handed over
/// there, not on the worker that ran the request.
#[derive(Debug)]
pub struct PendingFetch {
    handle: FetchHandle,
    outcome: oneshot::Receiver<FetchOutcome>,
}

impl PendingFetch {
    pub(crate) fn new(handle: FetchHandle, outcome: oneshot::Receiver<FetchOutcome>) -> Self {
        Self { handle, outcome }
    }

    /// Identifier used in this fetch's log events.
    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// The underlying handle.
    pub fn handle(&self) -> &FetchHandle {
        &self.handle
    }

    /// Cancel the fetch. See [`FetchHandle::cancel`].
    pub fn cancel(self) -> bool {
        self.handle.cancel()
    }

    /// Wait for the terminal outcome.
    ///
    /// Returns `None` only if the fetch was cancelled or its task died.
    /// Dropping this future cancels the fetch.
    pub async fn outcome(self) -> Option<FetchOutcome> {
        let PendingFetch { handle, outcome } = self;
        let result = outcome.await.ok();
        drop(handle);
        result
    }
}

/// Holder for at most one outstanding fetch, latest wins.
///
/// Installing a new handle cancels the previous one, so overlapping
/// refreshes can never deliver out of order.
#[derive(Debug, Default)]
pub struct LatestFetch {
    current: Mutex<Option<FetchHandle>>,
}

impl LatestFetch {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `handle` the outstanding fetch.
    ///
    /// Returns `true` if a previous fetch was still pending and got cancelled.
    pub fn replace(&self, handle: FetchHandle) -> bool {
        let previous = self.current.lock().replace(handle);
        previous.map(|prev| prev.cancel()).unwrap_or(false)
    }

    /// Cancel the outstanding fetch, if any.
    pub fn cancel(&self) -> bool {
        let current = self.current.lock().take();
        current.map(|handle| handle.cancel()).unwrap_or(false)
    }

    /// Returns true if the outstanding fetch has not delivered yet.
    pub fn is_in_flight(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(FetchHandle::is_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A handle whose task delivers an empty outcome after `delay`.
    fn delayed_handle(id: u64, delay: Duration, delivered: Arc<AtomicUsize>) -> FetchHandle {
        let deliver: Deliver = Box::new(move |_outcome| {
            delivered.fetch_add(1, Ordering::SeqCst);
        });
        let slot: DeliverySlot = Arc::new(Mutex::new(Some(deliver)));
        let task_slot = slot.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let deliver = task_slot.lock().take();
            if let Some(deliver) = deliver {
                deliver(Ok(Vec::new()));
            }
        });
        FetchHandle::new(id, task, slot)
    }

    #[tokio::test]
    async fn test_cancel_before_delivery() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let handle = delayed_handle(1, Duration::from_millis(50), delivered.clone());

        assert!(handle.is_pending());
        assert!(handle.cancel());
        assert!(!handle.is_pending());
        // A second cancel has nothing left to cancel
        assert!(!handle.cancel());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_cancel_after_delivery() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let handle = delayed_handle(2, Duration::from_millis(1), delivered.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert!(!handle.cancel());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let delivered = Arc::new(AtomicUsize::new(0));
        drop(delayed_handle(3, Duration::from_millis(50), delivered.clone()));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_latest_fetch_cancels_previous() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let latest = LatestFetch::new();

        assert!(!latest.replace(delayed_handle(4, Duration::from_millis(50), delivered.clone())));
        assert!(latest.is_in_flight());
        assert!(latest.replace(delayed_handle(5, Duration::from_millis(50), delivered.clone())));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert!(!latest.is_in_flight());
        assert!(!latest.cancel());
    }

    #[tokio::test]
    async fn test_pending_fetch_outcome_none_when_task_dies() {
        let (tx, rx) = oneshot::channel::<FetchOutcome>();
        let deliver: Deliver = Box::new(move |outcome| {
            let _ = tx.send(outcome);
        });
        let slot: DeliverySlot = Arc::new(Mutex::new(Some(deliver)));
        let task_slot = slot.clone();
        let task = tokio::spawn(async move {
            // Simulates a task that exits without delivering
            drop(task_slot.lock().take());
        });

        let pending = PendingFetch::new(FetchHandle::new(6, task, slot), rx);
        assert_eq!(pending.id(), 6);
        assert!(pending.outcome().await.is_none());
    }
}
