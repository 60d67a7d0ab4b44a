//! Link creation and retrieval service.

use std::sync::Arc;

use serde_json::json;
use url::Url;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, is_reserved_code};

/// Attempts made to find a free short code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// A link together with its recorded click count.
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub link: Link,
    pub total_clicks: i64,
}

/// Service for creating and retrieving shortened links.
pub struct LinkService {
    link_repository: Arc<dyn LinkRepository>,
    click_repository: Arc<dyn ClickRepository>,
}

impl LinkService {
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        click_repository: Arc<dyn ClickRepository>,
    ) -> Self {
        Self {
            link_repository,
            click_repository,
        }
    }

    /// Creates a short link for `long_url`.
    ///
    /// A random six-character code is generated; if the store reports a
    /// conflict or the code names a fixed route, a fresh code is tried, up to
    /// five attempts in total.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not an absolute
    /// `http`/`https` address.
    ///
    /// Returns [`AppError::Internal`] if no free code was found or on storage
    /// errors.
    pub async fn create_link(&self, long_url: &str) -> Result<Link, AppError> {
        self.create_link_with(long_url, generate_code).await
    }

    async fn create_link_with(
        &self,
        long_url: &str,
        mut next_code: impl FnMut() -> String + Send,
    ) -> Result<Link, AppError> {
        let long_url = validate_long_url(long_url)?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = next_code();
            if is_reserved_code(&code) {
                tracing::debug!(attempt, %code, "Generated code is reserved, retrying");
                continue;
            }

            let new_link = NewLink {
                code,
                long_url: long_url.clone(),
            };

            match self.link_repository.create(new_link).await {
                Ok(link) => {
                    tracing::info!(code = %link.code, link_id = link.id, "Short link created");
                    return Ok(link);
                }
                Err(AppError::Conflict { .. }) => {
                    tracing::debug!(attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    /// Retrieves a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty code.
    /// Returns [`AppError::NotFound`] if no link has this code.
    pub async fn get_link_by_code(&self, code: &str) -> Result<Link, AppError> {
        if code.trim().is_empty() {
            return Err(AppError::bad_request(
                "Short code must not be empty",
                json!({}),
            ));
        }

        self.link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))
    }

    /// Returns the link for `code` along with its click count.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_link_by_code`], plus storage errors from counting.
    pub async fn get_link_stats(&self, code: &str) -> Result<LinkStats, AppError> {
        let link = self.get_link_by_code(code).await?;
        let total_clicks = self.click_repository.count_by_link_id(link.id).await?;

        Ok(LinkStats { link, total_clicks })
    }

    /// Builds the public short URL for `code` under `base_url`.
    pub fn short_url(base_url: &str, code: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), code)
    }
}

fn validate_long_url(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();

    let url = Url::parse(raw).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::bad_request(
            "URL must use http or https",
            json!({ "scheme": url.scheme() }),
        ));
    }

    Ok(raw.to_string())
}
