//! Click record passed from the redirect handler to the worker pool.

use chrono::{DateTime, Utc};

/// One observed redirect event awaiting persistence.
///
/// Built by the redirect handler at enqueue time and pushed into the
/// [`crate::domain::click_queue::ClickQueue`]. A record is consumed by exactly
/// one worker; ownership moves into the store on a successful write and the
/// record is dropped if the write fails.
///
/// Client metadata is optional: an absent header and an empty header are
/// both stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRecord {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl ClickRecord {
    /// Creates a record stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use shortlink::domain::click_record::ClickRecord;
    ///
    /// let record = ClickRecord::new(42, Some("Mozilla/5.0"), Some("10.0.0.1".to_string()));
    /// assert_eq!(record.link_id, 42);
    /// assert_eq!(record.user_agent.as_deref(), Some("Mozilla/5.0"));
    /// ```
    pub fn new(link_id: i64, user_agent: Option<&str>, ip: Option<String>) -> Self {
        Self::at(link_id, Utc::now(), user_agent, ip)
    }

    /// Creates a record with an explicit event time.
    pub fn at(
        link_id: i64,
        clicked_at: DateTime<Utc>,
        user_agent: Option<&str>,
        ip: Option<String>,
    ) -> Self {
        Self {
            link_id,
            clicked_at,
            user_agent: user_agent
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ip: ip.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_record_creation_full() {
        let record = ClickRecord::new(
            7,
            Some("Mozilla/5.0"),
            Some("192.168.1.1".to_string()),
        );

        assert_eq!(record.link_id, 7);
        assert_eq!(record.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(record.ip.as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn test_click_record_creation_minimal() {
        let record = ClickRecord::new(3, None, None);

        assert_eq!(record.link_id, 3);
        assert!(record.user_agent.is_none());
        assert!(record.ip.is_none());
    }

    #[test]
    fn test_empty_metadata_is_none() {
        let record = ClickRecord::new(1, Some("   "), Some(String::new()));

        assert!(record.user_agent.is_none());
        assert!(record.ip.is_none());
    }

    #[test]
    fn test_timestamp_assigned_at_creation() {
        let before = Utc::now();
        let record = ClickRecord::new(1, None, None);
        let after = Utc::now();

        assert!(record.clicked_at >= before && record.clicked_at <= after);
    }
}
