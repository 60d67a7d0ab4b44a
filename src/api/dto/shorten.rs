//! DTOs for link creation endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// The original URL to shorten (must be absolute http/https).
    #[validate(url(message = "Invalid URL format"))]
    pub long_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLinkResponse {
    pub short_code: String,
    pub long_url: String,
    pub full_short_url: String,
}
