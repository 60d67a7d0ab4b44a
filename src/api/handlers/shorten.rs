//! Handler for link creation endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::shorten::{CreateLinkRequest, CreateLinkResponse};
use crate::application::services::LinkService;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a long URL.
///
/// # Endpoint
///
/// `POST /api/v1/links`
///
/// # Request Body
///
/// ```json
/// { "long_url": "https://example.com/some/page" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_code": "aB3xY9",
///   "long_url": "https://example.com/some/page",
///   "full_short_url": "http://localhost:8080/aB3xY9"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the body is not valid JSON or the URL is
/// missing, malformed, or not http/https.
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state.link_service.create_link(&payload.long_url).await?;

    let response = CreateLinkResponse {
        full_short_url: LinkService::short_url(&state.base_url, &link.code),
        short_code: link.code,
        long_url: link.long_url,
    };

    Ok((StatusCode::CREATED, Json(response)))
}
