//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`    - Short link redirect (public, not rate limited)
//! - `GET  /health`    - Health check: click queue and link monitor
//! - `/api/v1/*`       - REST API (rate limited per client)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client sliding window on the API group
//! - **Path normalization** - Trailing slash handling

use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// All routes with tracing, before path normalization.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api/v1", api::routes::api_routes(state.clone()))
        .with_state(state)
        .layer(tracing::layer())
}
