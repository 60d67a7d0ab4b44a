//! Repository trait for click persistence and counting.

use crate::domain::click_record::ClickRecord;
use crate::domain::entities::Click;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for click records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryStore`] - process-local store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Persists a click record. Called by a worker exactly once per record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the referenced link does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, record: ClickRecord) -> Result<Click, AppError>;

    /// Counts clicks recorded for a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count_by_link_id(&self, link_id: i64) -> Result<i64, AppError>;
}
