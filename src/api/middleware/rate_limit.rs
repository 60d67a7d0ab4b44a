//! Per-client sliding-window rate limiting.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tracing::debug;

use crate::api::extract::ClientAddr;
use crate::error::AppError;
use crate::state::AppState;

/// Admits or rejects a request using the shared [`crate::domain::rate_limiter::RateLimiter`].
///
/// # Key Extraction
///
/// Requests are keyed by [`ClientAddr`]; callers without a resolvable
/// address share the `"unknown"` bucket.
///
/// Rejected requests receive `429 Too Many Requests` and are not forwarded.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/links", post(shorten_handler))
///     .route_layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(
    State(state): State<AppState>,
    client: ClientAddr,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client.rate_limit_key();

    if !state.rate_limiter.allow(key) {
        debug!(client = key, path = %request.uri().path(), "Rate limit exceeded");

        return Err(AppError::too_many_requests(
            "Rate limit exceeded",
            json!({
                "limit": state.rate_limiter.requests(),
                "window_seconds": state.rate_limiter.window().as_secs(),
            }),
        ));
    }

    Ok(next.run(request).await)
}
