//! API route configuration.
//!
//! Every route in this group passes through [`crate::api::middleware::rate_limit`].

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::api::handlers::{shorten_handler, stats_handler};
use crate::api::middleware::rate_limit;
use crate::state::AppState;

/// Versioned API routes, rate limited per client.
///
/// # Endpoints
///
/// - `POST /links`               - Create a short link
/// - `GET  /links/{code}/stats`  - Click count and liveness of a link
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/links", post(shorten_handler))
        .route("/links/{code}/stats", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(state, rate_limit::layer))
}
