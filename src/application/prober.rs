//! Reachability probes for link targets.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Timeout applied to every liveness probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks whether a target address currently answers.
///
/// Implementations never fail: anything other than a definite success is
/// reported as unreachable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    async fn is_reachable(&self, target: &str) -> bool;
}

/// Probes targets with an HTTP `HEAD` request.
///
/// Redirects are followed by the client; the final status counts as
/// reachable when it is in the 2xx or 3xx range.
#[derive(Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Builds a prober with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shortlink-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn is_reachable(&self, target: &str) -> bool {
        let url = match Url::parse(target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                debug!(target, scheme = url.scheme(), "Unsupported scheme, marking unreachable");
                return false;
            }
            Err(e) => {
                debug!(target, error = %e, "Malformed target, marking unreachable");
                return false;
            }
        };

        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.is_redirection()
            }
            Err(e) => {
                debug!(target, error = %e, "Probe failed");
                false
            }
        }
    }
}
