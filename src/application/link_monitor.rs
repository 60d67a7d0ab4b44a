//! Periodic link liveness monitor.
//!
//! Runs one pass immediately and then one pass per interval tick until the
//! shutdown token fires. A pass lists every link, probes its target, corrects
//! the persisted `is_active` flag when it disagrees with the probe, and
//! compares the probe against the in-memory [`LivenessTable`] to report
//! transitions.
//!
//! The first time a link is seen it is recorded without a transition, even
//! when the probe disagrees with the stored flag; only the store is corrected.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::prober::Prober;
use crate::domain::entities::Link;
use crate::domain::liveness::{Liveness, LivenessTable, LivenessTransition, Observation};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Shortest allowed interval between passes.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Summary of one monitor pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Links probed during this pass.
    pub checked: usize,
    /// Links whose persisted flag was corrected.
    pub updated: usize,
    /// Links whose corrected flag could not be persisted.
    pub update_failures: usize,
    pub transitions: Vec<LivenessTransition>,
    /// The pass stopped early because shutdown was requested.
    pub interrupted: bool,
}

pub struct LinkMonitor {
    links: Arc<dyn LinkRepository>,
    prober: Arc<dyn Prober>,
    states: Arc<LivenessTable>,
    interval: Duration,
}

impl LinkMonitor {
    /// Creates a monitor polling every `interval_minutes` minutes (minimum one).
    pub fn new(
        links: Arc<dyn LinkRepository>,
        prober: Arc<dyn Prober>,
        states: Arc<LivenessTable>,
        interval_minutes: u64,
    ) -> Self {
        let interval = Duration::from_secs(interval_minutes.max(1).saturating_mul(60));

        Self {
            links,
            prober,
            states,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Shared view of the last observed state per link.
    pub fn states(&self) -> Arc<LivenessTable> {
        self.states.clone()
    }

    /// Starts the monitor loop on a dedicated task.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Runs passes until `shutdown` is cancelled.
    ///
    /// The first tick of the interval completes immediately, which gives the
    /// startup pass. Passes run sequentially on this task and never overlap.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Link monitor started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.run_pass(&shutdown).await {
                Ok(report) => {
                    metrics::counter!("link_monitor_passes_total").increment(1);
                    info!(
                        checked = report.checked,
                        updated = report.updated,
                        update_failures = report.update_failures,
                        transitions = report.transitions.len(),
                        interrupted = report.interrupted,
                        "Link liveness pass finished"
                    );
                }
                Err(e) => {
                    metrics::counter!("link_monitor_pass_failures_total").increment(1);
                    error!(error = %e, "Link liveness pass aborted: could not list links");
                }
            }
        }

        info!("Link monitor stopped");
    }

    /// Performs a single liveness pass.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the links cannot be listed; nothing is
    /// probed or updated in that case. Per-link update failures are counted in
    /// the report instead.
    pub async fn run_pass(&self, shutdown: &CancellationToken) -> Result<PassReport, AppError> {
        debug!("Starting link liveness pass");

        let links = self.links.list_all().await?;
        let mut report = PassReport::default();

        for link in links {
            // Checked between links only; a started probe and its update always finish.
            if shutdown.is_cancelled() {
                report.interrupted = true;
                break;
            }

            let reachable = self.prober.is_reachable(&link.long_url).await;

            report.checked += 1;
            self.apply_probe(&link, Liveness::from(reachable), &mut report)
                .await;
        }

        Ok(report)
    }

    async fn apply_probe(&self, link: &Link, current: Liveness, report: &mut PassReport) {
        let observation = self.states.observe(link.id, current);

        if current.is_accessible() != link.is_active {
            match self.links.update(&link.with_active(current.is_accessible())).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    report.update_failures += 1;
                    metrics::counter!("link_liveness_update_failures_total").increment(1);
                    error!(
                        link_id = link.id,
                        code = %link.code,
                        long_url = %link.long_url,
                        error = %e,
                        "Failed to persist link liveness"
                    );
                }
            }
        }

        match observation {
            Observation::Initial => {
                info!(
                    link_id = link.id,
                    code = %link.code,
                    long_url = %link.long_url,
                    state = %current,
                    "Initial liveness state"
                );
            }
            Observation::Unchanged => {}
            Observation::Changed { from } => {
                let transition = LivenessTransition {
                    link_id: link.id,
                    code: link.code.clone(),
                    long_url: link.long_url.clone(),
                    from,
                    to: current,
                };
                metrics::counter!("link_liveness_transitions_total").increment(1);
                warn!(
                    link_id = link.id,
                    from = %from,
                    to = %current,
                    "Link liveness changed: {transition}"
                );
                report.transitions.push(transition);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prober::MockProber;
    use crate::domain::repositories::MockLinkRepository;
    use chrono::Utc;
    use serde_json::json;

    fn link(id: i64, is_active: bool) -> Link {
        Link::new(
            id,
            format!("code{id}"),
            format!("https://site{id}.example"),
            Utc::now(),
            is_active,
        )
    }

    fn prober_returning(results: Vec<bool>) -> MockProber {
        let mut prober = MockProber::new();
        let mut results = results.into_iter();
        prober
            .expect_is_reachable()
            .returning(move |_| results.next().unwrap_or(false));
        prober
    }

    fn monitor(links: MockLinkRepository, prober: MockProber) -> LinkMonitor {
        LinkMonitor::new(
            Arc::new(links),
            Arc::new(prober),
            Arc::new(LivenessTable::new()),
            5,
        )
    }

    #[tokio::test]
    async fn test_first_pass_corrects_store_without_transition() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .times(1)
            .returning(|| Ok(vec![link(1, true)]));
        links
            .expect_update()
            .withf(|l| l.id == 1 && !l.is_active)
            .times(1)
            .returning(|_| Ok(()));

        let monitor = monitor(links, prober_returning(vec![false]));
        let report = monitor.run_pass(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.checked, 1);
        assert_eq!(report.updated, 1);
        assert!(report.transitions.is_empty());
        assert_eq!(monitor.states().get(1), Some(Liveness::Inaccessible));
    }

    #[tokio::test]
    async fn test_flip_reports_one_transition_and_one_update() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .times(2)
            .returning(|| Ok(vec![link(1, true)]));
        links
            .expect_update()
            .withf(|l| l.id == 1 && !l.is_active)
            .times(1)
            .returning(|_| Ok(()));

        let monitor = monitor(links, prober_returning(vec![true, false]));
        let shutdown = CancellationToken::new();

        let first = monitor.run_pass(&shutdown).await.unwrap();
        assert_eq!(first.updated, 0);
        assert!(first.transitions.is_empty());

        let second = monitor.run_pass(&shutdown).await.unwrap();
        assert_eq!(second.updated, 1);
        assert_eq!(second.transitions.len(), 1);
        assert_eq!(second.transitions[0].link_id, 1);
        assert_eq!(second.transitions[0].from, Liveness::Accessible);
        assert_eq!(second.transitions[0].to, Liveness::Inaccessible);
    }

    #[tokio::test]
    async fn test_agreeing_probe_does_not_update() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .returning(|| Ok(vec![link(1, true), link(2, false)]));
        links.expect_update().never();

        let monitor = monitor(links, prober_returning(vec![true, false]));
        let report = monitor.run_pass(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.updated, 0);
        assert!(report.transitions.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_pass() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .times(1)
            .returning(|| Err(AppError::internal("Database error", json!({}))));
        links.expect_update().never();

        let mut prober = MockProber::new();
        prober.expect_is_reachable().never();

        let monitor = monitor(links, prober);
        let result = monitor.run_pass(&CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
        assert!(monitor.states().is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_does_not_abort_pass() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .returning(|| Ok(vec![link(1, true), link(2, true)]));
        links
            .expect_update()
            .withf(|l| l.id == 1)
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        links
            .expect_update()
            .withf(|l| l.id == 2)
            .times(1)
            .returning(|_| Ok(()));

        let monitor = monitor(links, prober_returning(vec![false, false]));
        let report = monitor.run_pass(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.update_failures, 1);
    }

    #[tokio::test]
    async fn test_cancelled_pass_stops_probing() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .returning(|| Ok(vec![link(1, true), link(2, true)]));
        links.expect_update().never();

        let mut prober = MockProber::new();
        prober.expect_is_reachable().never();

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let monitor = monitor(links, prober);
        let report = monitor.run_pass(&shutdown).await.unwrap();

        assert!(report.interrupted);
        assert_eq!(report.checked, 0);
    }

    #[tokio::test]
    async fn test_shutdown_mid_pass_finishes_current_link() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_all()
            .returning(|| Ok(vec![link(1, true), link(2, true)]));
        links
            .expect_update()
            .withf(|l| l.id == 1)
            .times(1)
            .returning(|_| Ok(()));

        let shutdown = CancellationToken::new();
        let mut prober = MockProber::new();
        {
            let shutdown = shutdown.clone();
            prober.expect_is_reachable().times(1).returning(move |_| {
                shutdown.cancel();
                false
            });
        }

        let monitor = monitor(links, prober);
        let report = monitor.run_pass(&shutdown).await.unwrap();

        assert!(report.interrupted);
        assert_eq!(report.checked, 1);
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn test_interval_has_one_minute_floor() {
        let monitor = monitor(MockLinkRepository::new(), MockProber::new());
        assert_eq!(monitor.interval(), Duration::from_secs(300));

        let monitor = LinkMonitor::new(
            Arc::new(MockLinkRepository::new()),
            Arc::new(MockProber::new()),
            Arc::new(LivenessTable::new()),
            0,
        );
        assert_eq!(monitor.interval(), MIN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_passes_immediately_then_every_interval() {
        let mut links = MockLinkRepository::new();
        links.expect_list_all().times(3).returning(|| Ok(vec![]));

        let monitor = Arc::new(monitor(links, MockProber::new()));
        let shutdown = CancellationToken::new();
        let handle = monitor.clone().spawn(shutdown.clone());

        // Startup pass plus two ticks at 5 and 10 minutes.
        tokio::time::sleep(Duration::from_secs(10 * 60 + 1)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop promptly")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_listing_failure() {
        let mut links = MockLinkRepository::new();
        let mut calls = 0;
        links.expect_list_all().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(AppError::internal("Database error", json!({})))
            } else {
                Ok(vec![])
            }
        });

        let monitor = Arc::new(monitor(links, MockProber::new()));
        let shutdown = CancellationToken::new();
        let handle = monitor.clone().spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
        shutdown.cancel();
        handle.await.unwrap();
    }
}
