//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tracing::debug;

use crate::api::extract::ClientAddr;
use crate::domain::click_record::ClickRecord;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look up the link by code
/// 2. Build a [`ClickRecord`] from the client address and `User-Agent`
/// 3. Offer it to the click queue without waiting
/// 4. Return 302 Found
///
/// # Click Tracking
///
/// The redirect never waits on persistence. If the queue is full or closed
/// the click is dropped and logged by the queue; the client still gets its
/// redirect.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ClientAddr(ip): ClientAddr,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let link = state.link_service.get_link_by_code(&code).await?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    if !state
        .click_queue
        .enqueue(ClickRecord::new(link.id, user_agent, ip))
    {
        debug!(code = %code, "Click not recorded");
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, link.long_url)]))
}
