//! DTOs for link statistics endpoint.

use serde::{Deserialize, Serialize};

use crate::application::services::LinkStats;

/// Click statistics for one short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkStatsResponse {
    pub short_code: String,
    pub long_url: String,
    /// Result of the most recent liveness probe persisted for this link.
    pub is_active: bool,
    pub total_clicks: i64,
}

impl From<LinkStats> for LinkStatsResponse {
    fn from(stats: LinkStats) -> Self {
        Self {
            short_code: stats.link.code,
            long_url: stats.link.long_url,
            is_active: stats.link.is_active,
            total_clicks: stats.total_clicks,
        }
    }
}
