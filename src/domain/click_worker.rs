//! Fixed-size pool of click workers draining the [`ClickQueue`] into storage.
//!
//! Each worker loops on [`ClickQueue::next`] and hands every record to
//! [`ClickRepository::create`]. A failed write is logged with the record's
//! link id and the record is dropped: click accounting is at-most-once and
//! best-effort so the redirect path never waits on storage.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::click_queue::ClickQueue;
use crate::domain::click_record::ClickRecord;
use crate::domain::repositories::ClickRepository;

/// Handle to the running click workers.
pub struct ClickWorkerPool {
    workers: JoinSet<()>,
    stop: CancellationToken,
    queue: Arc<ClickQueue>,
    size: usize,
}

impl ClickWorkerPool {
    /// Spawns `count` workers on the current Tokio runtime.
    pub fn spawn(
        count: usize,
        queue: Arc<ClickQueue>,
        repository: Arc<dyn ClickRepository>,
    ) -> Self {
        let stop = CancellationToken::new();
        let mut workers = JoinSet::new();

        for worker_id in 0..count {
            workers.spawn(run_click_worker(
                worker_id,
                queue.clone(),
                repository.clone(),
                stop.clone(),
            ));
        }

        info!(workers = count, capacity = queue.capacity(), "Click workers started");

        Self {
            workers,
            stop,
            queue,
            size: count,
        }
    }

    /// Number of workers spawned.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Closes the queue and lets the workers drain it for at most `grace`.
    ///
    /// Returns `true` if every worker finished within the grace period. When
    /// the period elapses the workers are told to stop after their current
    /// write; in-flight writes are never aborted and whatever is still
    /// buffered is abandoned.
    pub async fn shutdown(mut self, grace: Duration) -> bool {
        self.queue.close();

        let drained = tokio::time::timeout(grace, async {
            while self.workers.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if drained {
            info!("Click workers drained the queue and stopped");
        } else {
            self.stop.cancel();
            warn!(
                abandoned = self.queue.len(),
                grace_ms = grace.as_millis() as u64,
                "Click worker grace period elapsed, abandoning remaining clicks"
            );
            self.workers.detach_all();
        }

        drained
    }
}

/// Worker loop: take the next record, persist it, repeat.
///
/// Exits when the queue is closed and empty, or when `stop` is cancelled.
pub async fn run_click_worker(
    worker_id: usize,
    queue: Arc<ClickQueue>,
    repository: Arc<dyn ClickRepository>,
    stop: CancellationToken,
) {
    debug!(worker = worker_id, "Click worker running");

    loop {
        let record = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            next = queue.next() => match next {
                Some(record) => record,
                None => break,
            },
        };

        persist_click(worker_id, repository.as_ref(), record).await;
    }

    debug!(worker = worker_id, "Click worker stopped");
}

async fn persist_click(worker_id: usize, repository: &dyn ClickRepository, record: ClickRecord) {
    let link_id = record.link_id;

    match repository.create(record).await {
        Ok(click) => {
            metrics::counter!("clicks_persisted_total").increment(1);
            debug!(worker = worker_id, link_id, click_id = click.id, "Click persisted");
        }
        Err(e) => {
            metrics::counter!("click_persist_failures_total").increment(1);
            warn!(worker = worker_id, link_id, error = %e, "Failed to persist click, dropping it");
        }
    }
}
