//! Bounded click ingestion queue.
//!
//! The queue is the only hand-off between the redirect path and the click
//! workers. Producers call [`ClickQueue::enqueue`], which never waits: when the
//! buffer is full or the queue has been closed the record is dropped and the
//! call returns `false`. Workers call [`ClickQueue::next`], which suspends only
//! while the buffer is empty.
//!
//! Internally this is a `tokio::sync::mpsc` channel. The receiver sits behind
//! an async mutex so that any number of workers can share it while each record
//! is still delivered to exactly one of them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::click_record::ClickRecord;

/// Shared bounded buffer of pending click records.
///
/// Construct once at startup, wrap in an [`Arc`] and hand clones to the
/// request layer and to [`crate::domain::click_worker::ClickWorkerPool`].
pub struct ClickQueue {
    sender: mpsc::Sender<ClickRecord>,
    receiver: Mutex<mpsc::Receiver<ClickRecord>>,
    closed: CancellationToken,
    capacity: usize,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl ClickQueue {
    /// Creates a queue holding at most `capacity` pending records.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);

        Self {
            sender,
            receiver: Mutex::new(receiver),
            closed: CancellationToken::new(),
            capacity,
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Convenience constructor returning the queue already wrapped in an [`Arc`].
    pub fn shared(capacity: usize) -> Arc<Self> {
        Arc::new(Self::new(capacity))
    }

    /// Offers a record without waiting.
    ///
    /// Returns `true` if the record was buffered. Returns `false` if the queue
    /// is full or closed; the record is discarded and the drop is logged and
    /// counted. This is load shedding, not an error.
    pub fn enqueue(&self, record: ClickRecord) -> bool {
        if self.closed.is_cancelled() {
            self.record_drop(record.link_id, "closed");
            return false;
        }

        match self.sender.try_send(record) {
            Ok(()) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("click_queue_accepted_total").increment(1);
                true
            }
            Err(mpsc::error::TrySendError::Full(record)) => {
                self.record_drop(record.link_id, "full");
                false
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                self.record_drop(record.link_id, "closed");
                false
            }
        }
    }

    fn record_drop(&self, link_id: i64, reason: &'static str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("click_queue_dropped_total", "reason" => reason).increment(1);
        warn!(link_id, reason, "Click queue rejected record, dropping click");
    }

    /// Takes the next pending record.
    ///
    /// Suspends while the queue is empty and open. Once the queue is closed
    /// this returns the remaining buffered records one by one and then `None`.
    pub async fn next(&self) -> Option<ClickRecord> {
        let mut receiver = self.receiver.lock().await;

        if !self.closed.is_cancelled() {
            tokio::select! {
                biased;
                record = receiver.recv() => return record,
                _ = self.closed.cancelled() => {}
            }
        }

        // Closing the channel itself makes every later `try_send` fail, so a
        // producer that raced `close` either lands in the buffer drained
        // below or is rejected.
        receiver.close();
        receiver.recv().await
    }

    /// Stops accepting new records. Already buffered records stay available
    /// to [`Self::next`] so workers can drain them.
    pub fn close(&self) {
        if !self.closed.is_cancelled() {
            debug!(pending = self.len(), "Closing click queue");
            self.closed.cancel();
        }

        // Seal the channel right away when no worker holds the receiver.
        if let Ok(mut receiver) = self.receiver.try_lock() {
            receiver.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total records accepted since construction.
    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Total records dropped (full or closed) since construction.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(link_id: i64) -> ClickRecord {
        ClickRecord::new(link_id, Some("test-agent"), Some("127.0.0.1".to_string()))
    }

    #[test]
    fn test_capacity_one_without_workers() {
        let queue = ClickQueue::new(1);

        assert!(queue.enqueue(record(1)));
        assert!(!queue.enqueue(record(2)));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.accepted_count(), 1);
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn test_first_c_enqueues_succeed() {
        let queue = ClickQueue::new(5);

        for id in 0..5 {
            assert!(queue.enqueue(record(id)), "enqueue {id} should be accepted");
        }
        assert!(!queue.enqueue(record(99)));
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let queue = ClickQueue::new(0);

        assert_eq!(queue.capacity(), 1);
        assert!(queue.enqueue(record(1)));
        assert!(!queue.enqueue(record(2)));
    }

    #[test]
    fn test_closed_queue_rejects() {
        let queue = ClickQueue::new(10);
        queue.close();

        assert!(queue.is_closed());
        assert!(!queue.enqueue(record(1)));
        assert!(queue.is_empty());
        assert_eq!(queue.dropped_count(), 1);
    }

    #[tokio::test]
    async fn test_next_returns_records_in_order_for_single_consumer() {
        let queue = ClickQueue::new(4);
        queue.enqueue(record(1));
        queue.enqueue(record(2));

        assert_eq!(queue.next().await.map(|r| r.link_id), Some(1));
        assert_eq!(queue.next().await.map(|r| r.link_id), Some(2));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = ClickQueue::new(4);
        queue.enqueue(record(1));
        queue.enqueue(record(2));
        queue.close();

        assert_eq!(queue.next().await.map(|r| r.link_id), Some(1));
        assert_eq!(queue.next().await.map(|r| r.link_id), Some(2));
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn test_record_sent_after_close_signal_is_still_drained() {
        let queue = ClickQueue::new(4);
        let held = queue.receiver.lock().await;

        // A worker holds the receiver, so `close` only raises the flag and a
        // producer that already passed the flag check can still get through.
        queue.close();
        assert!(queue.sender.try_send(record(7)).is_ok());
        drop(held);

        assert_eq!(queue.next().await.map(|r| r.link_id), Some(7));
        assert!(queue.next().await.is_none());
        assert!(queue.sender.try_send(record(8)).is_err());
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let queue = ClickQueue::shared(4);

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("consumer should wake up on close")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_waiting_consumer_receives_new_record() {
        let queue = ClickQueue::shared(4);

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(queue.enqueue(record(42)));

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.map(|r| r.link_id), Some(42));
    }
}
