//! In-memory last-known reachability of every monitored link.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Observed reachability of a link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Liveness {
    Accessible,
    Inaccessible,
}

impl Liveness {
    pub fn is_accessible(self) -> bool {
        matches!(self, Liveness::Accessible)
    }
}

impl From<bool> for Liveness {
    fn from(accessible: bool) -> Self {
        if accessible {
            Liveness::Accessible
        } else {
            Liveness::Inaccessible
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Accessible => f.write_str("ACCESSIBLE"),
            Liveness::Inaccessible => f.write_str("INACCESSIBLE"),
        }
    }
}

/// Outcome of recording one probe result for a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First time this process has seen the link.
    Initial,
    Unchanged,
    Changed { from: Liveness },
}

/// A link whose reachability differs between two consecutive passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessTransition {
    pub link_id: i64,
    pub code: String,
    pub long_url: String,
    pub from: Liveness,
    pub to: Liveness,
}

impl fmt::Display for LivenessTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "link {} ({}) went from {} to {}",
            self.code, self.long_url, self.from, self.to
        )
    }
}

/// Process-lifetime map from link id to last observed reachability.
///
/// Written by the liveness monitor, readable by anyone holding a reference.
/// Every update takes the table lock once.
#[derive(Debug, Default)]
pub struct LivenessTable {
    states: Mutex<HashMap<i64, Liveness>>,
}

impl LivenessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `current` for `link_id` and reports how it relates to the
    /// previously stored value.
    pub fn observe(&self, link_id: i64, current: Liveness) -> Observation {
        let previous = self
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(link_id, current);

        match previous {
            None => Observation::Initial,
            Some(from) if from == current => Observation::Unchanged,
            Some(from) => Observation::Changed { from },
        }
    }

    pub fn get(&self, link_id: i64) -> Option<Liveness> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&link_id)
            .copied()
    }

    /// Copy of the whole table.
    pub fn snapshot(&self) -> HashMap<i64, Liveness> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_initial() {
        let table = LivenessTable::new();

        assert_eq!(table.observe(1, Liveness::Inaccessible), Observation::Initial);
        assert_eq!(table.get(1), Some(Liveness::Inaccessible));
    }

    #[test]
    fn test_change_reports_previous_state() {
        let table = LivenessTable::new();
        table.observe(1, Liveness::Inaccessible);

        assert_eq!(
            table.observe(1, Liveness::Accessible),
            Observation::Changed {
                from: Liveness::Inaccessible
            }
        );
        assert_eq!(table.observe(1, Liveness::Accessible), Observation::Unchanged);
    }

    #[test]
    fn test_links_are_independent() {
        let table = LivenessTable::new();
        table.observe(1, Liveness::Accessible);

        assert_eq!(table.observe(2, Liveness::Inaccessible), Observation::Initial);
        assert_eq!(table.len(), 2);
        assert_eq!(table.snapshot().get(&1), Some(&Liveness::Accessible));
    }

    #[test]
    fn test_display() {
        assert_eq!(Liveness::from(true).to_string(), "ACCESSIBLE");
        assert_eq!(Liveness::from(false).to_string(), "INACCESSIBLE");

        let transition = LivenessTransition {
            link_id: 3,
            code: "abc123".to_string(),
            long_url: "https://example.com".to_string(),
            from: Liveness::Inaccessible,
            to: Liveness::Accessible,
        };
        assert_eq!(
            transition.to_string(),
            "link abc123 (https://example.com) went from INACCESSIBLE to ACCESSIBLE"
        );
    }
}
