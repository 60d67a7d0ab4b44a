//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL with its last persisted liveness flag.
///
/// `is_active` is owned by the liveness monitor: it records whether the
/// target answered the most recent probe with a 2xx/3xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        id: i64,
        code: String,
        long_url: String,
        created_at: DateTime<Utc>,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            code,
            long_url,
            created_at,
            is_active,
        }
    }

    /// Returns a copy of this link carrying a different liveness flag.
    pub fn with_active(&self, is_active: bool) -> Self {
        Self {
            is_active,
            ..self.clone()
        }
    }
}

/// Input data for creating a new link. New links start out active.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
}
