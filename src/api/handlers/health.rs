//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Click queue is accepting records
/// - **503 Service Unavailable**: Click queue is closed (shutdown in progress)
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "click_queue": { "status": "ok", "message": "Depth: 0/100" },
///     "link_monitor": { "status": "ok", "message": "Tracking 12 links" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let queue_check = check_click_queue(&state);
    let monitor_check = check_link_monitor(&state);

    let healthy = queue_check.is_ok() && monitor_check.is_ok();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            click_queue: queue_check,
            link_monitor: monitor_check,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    let queue = &state.click_queue;

    if queue.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!("Depth: {}/{}", queue.len(), queue.capacity()))
    }
}

fn check_link_monitor(state: &AppState) -> CheckStatus {
    CheckStatus::ok(format!("Tracking {} links", state.liveness.len()))
}
