//! Handler for per-link statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::LinkStatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click count and liveness flag of a short link.
///
/// # Endpoint
///
/// `GET /api/v1/links/{code}/stats`
///
/// # Response
///
/// ```json
/// {
///   "short_code": "aB3xY9",
///   "long_url": "https://example.com",
///   "is_active": true,
///   "total_clicks": 42
/// }
/// ```
///
/// Clicks still waiting in the queue are not counted yet.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LinkStatsResponse>, AppError> {
    let stats = state.link_service.get_link_stats(&code).await?;

    Ok(Json(stats.into()))
}
