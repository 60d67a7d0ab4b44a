//! Click entity representing a single persisted redirect event.

use chrono::{DateTime, Utc};

/// A click as stored by the persistence layer.
///
/// Produced from a [`crate::domain::click_record::ClickRecord`] once a worker
/// has handed it to [`crate::domain::repositories::ClickRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl Click {
    /// Creates a new Click instance.
    pub fn new(
        id: i64,
        link_id: i64,
        clicked_at: DateTime<Utc>,
        user_agent: Option<String>,
        ip: Option<String>,
    ) -> Self {
        Self {
            id,
            link_id,
            clicked_at,
            user_agent,
            ip,
        }
    }
}
