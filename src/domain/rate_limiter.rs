//! Per-key sliding-window admission control.
//!
//! Each key (usually a client address) owns the list of its admission times
//! inside the trailing window. A check prunes entries at or before
//! `now - window`, rejects if `requests` entries remain, and otherwise records
//! `now` and admits.
//!
//! The whole table sits behind one mutex and the prune/check/append sequence
//! for a call runs inside a single critical section, so concurrent checks for
//! the same key are serialized and can never admit more than `requests` calls
//! within one window. Checks never await.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Bucket shared by every caller without an identifiable origin.
pub const UNKNOWN_CLIENT_KEY: &str = "unknown";

/// Fallback window used when a zero window is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Number of checks between two sweeps of fully expired keys.
const SWEEP_EVERY: u32 = 1024;

#[derive(Default)]
struct WindowTable {
    windows: HashMap<String, VecDeque<Instant>>,
    checks_since_sweep: u32,
}

impl WindowTable {
    /// Drops keys whose newest admission is already outside the window.
    fn sweep(&mut self, cutoff: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|_, timestamps| timestamps.back().is_some_and(|t| *t > cutoff));
        self.checks_since_sweep = 0;

        let removed = before - self.windows.len();
        if removed > 0 {
            debug!(removed, remaining = self.windows.len(), "Swept idle rate-limit keys");
        }
    }
}

/// Sliding-window rate limiter keyed by an arbitrary string.
pub struct RateLimiter {
    requests: usize,
    window: Duration,
    table: Mutex<WindowTable>,
}

impl RateLimiter {
    /// Creates a limiter admitting `requests` calls per `window` for each key.
    ///
    /// Zero requests is raised to one and a zero window falls back to one
    /// minute.
    pub fn new(requests: u32, window: Duration) -> Self {
        let requests = requests.max(1) as usize;
        let window = if window.is_zero() {
            DEFAULT_WINDOW
        } else {
            window
        };

        Self {
            requests,
            window,
            table: Mutex::new(WindowTable::default()),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decides whether one more call for `key` is admitted right now.
    ///
    /// Empty or blank keys share the [`UNKNOWN_CLIENT_KEY`] bucket.
    pub fn allow(&self, key: &str) -> bool {
        let key = normalize_key(key);
        let now = Instant::now();
        let cutoff = now.checked_sub(self.window);

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        table.checks_since_sweep += 1;
        if table.checks_since_sweep >= SWEEP_EVERY
            && let Some(cutoff) = cutoff
        {
            table.sweep(cutoff);
        }

        let timestamps = table.windows.entry(key.to_owned()).or_default();

        if let Some(cutoff) = cutoff {
            while timestamps.front().is_some_and(|t| *t <= cutoff) {
                timestamps.pop_front();
            }
        }

        if timestamps.len() >= self.requests {
            metrics::counter!("rate_limit_rejected_total").increment(1);
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }

    /// Removes every key with no admission inside the current window.
    pub fn purge_expired(&self) {
        if let Some(cutoff) = Instant::now().checked_sub(self.window) {
            self.table
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .sweep(cutoff);
        }
    }
}

fn normalize_key(key: &str) -> &str {
    let key = key.trim();
    if key.is_empty() {
        UNKNOWN_CLIENT_KEY
    } else {
        key
    }
}
