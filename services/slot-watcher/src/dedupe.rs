//! Deduplication of already-notified results
//!
//! Two records with the same location and start date are the same opportunity
//! for notification purposes; once reported they stay suppressed for the rest
//! of the process. The set grows monotonically and is never persisted.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::client::SlotRecord;

/// Identity of a notifiable opportunity.
///
/// The start date is part of the key, so the same location reappearing with a
/// new date triggers a fresh notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub location: String,
    pub start_date: Option<NaiveDate>,
}

impl MatchKey {
    pub fn of(record: &SlotRecord) -> Self {
        Self {
            location: record.location.clone(),
            start_date: record.start_date,
        }
    }
}

/// Keys already reported to the user. Owned by the poll loop.
#[derive(Debug, Default)]
pub struct NotifiedSet {
    seen: HashSet<MatchKey>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` has not been recorded yet.
    pub fn is_new(&self, key: &MatchKey) -> bool {
        !self.seen.contains(key)
    }

    /// Record a key. Call only after delivery is confirmed, so a failed send
    /// does not permanently suppress the result.
    pub fn record(&mut self, key: MatchKey) {
        self.seen.insert(key);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
