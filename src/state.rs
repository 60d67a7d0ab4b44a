use std::sync::Arc;

use crate::application::services::LinkService;
use crate::domain::click_queue::ClickQueue;
use crate::domain::liveness::LivenessTable;
use crate::domain::rate_limiter::RateLimiter;

/// Shared handles passed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub click_queue: Arc<ClickQueue>,
    pub rate_limiter: Arc<RateLimiter>,
    pub liveness: Arc<LivenessTable>,
    /// Public origin used to build `full_short_url`, without trailing slash.
    pub base_url: String,
    /// Trust `X-Forwarded-For` / `X-Real-IP` when resolving client addresses.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        click_queue: Arc<ClickQueue>,
        rate_limiter: Arc<RateLimiter>,
        liveness: Arc<LivenessTable>,
        base_url: impl Into<String>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            link_service,
            click_queue,
            rate_limiter,
            liveness,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            behind_proxy,
        }
    }
}
