//! Match criteria for polled records
//!
//! A record matches when the location contains the configured substring
//! (case-insensitive), at least one slot is open, and — when a date bound is
//! set — the start date is present and strictly before the bound. A missing
//! or unparseable start date fails closed under a date bound.

use chrono::NaiveDate;

use crate::client::SlotRecord;

/// Immutable per-invocation criteria.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub location_contains: Option<String>,
    pub before_date: Option<NaiveDate>,
}

impl Criteria {
    fn matches(&self, record: &SlotRecord) -> bool {
        if let Some(needle) = &self.location_contains {
            if !record
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        if record.open_count == 0 {
            return false;
        }

        if let Some(bound) = self.before_date {
            // No start date at all fails closed
            match record.start_date {
                Some(date) if date < bound => {}
                _ => return false,
            }
        }

        true
    }
}

/// Return the records matching `criteria`, preserving input order.
pub fn matching(records: &[SlotRecord], criteria: &Criteria) -> Vec<SlotRecord> {
    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: &str, open_count: u32, start_date: Option<&str>) -> SlotRecord {
        SlotRecord {
            location: location.to_owned(),
            open_count,
            start_date: start_date.map(|d| d.parse().unwrap()),
        }
    }

    fn toronto_before_march() -> Criteria {
        Criteria {
            location_contains: Some("toronto".into()),
            before_date: Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
        }
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        let records = vec![
            record("TORONTO (Consulate)", 3, Some("2026-01-01")),
            record("Ottawa", 3, Some("2026-01-01")),
        ];
        let matches = matching(&records, &toronto_before_march());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].location, "TORONTO (Consulate)");
    }

    #[test]
    fn zero_open_count_excluded() {
        let records = vec![record("Toronto", 0, Some("2026-01-01"))];
        assert!(matching(&records, &toronto_before_march()).is_empty());
    }

    #[test]
    fn date_bound_is_strict() {
        let records = vec![
            record("Toronto", 1, Some("2026-02-28")),
            record("Toronto", 1, Some("2026-03-01")),
            record("Toronto", 1, Some("2026-04-01")),
        ];
        let matches = matching(&records, &toronto_before_march());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start_date, "2026-02-28".parse().ok());
    }

    #[test]
    fn missing_date_fails_closed_under_date_bound() {
        let records = vec![record("Toronto", 5, None)];
        assert!(matching(&records, &toronto_before_march()).is_empty());
    }

    #[test]
    fn missing_date_passes_without_date_bound() {
        let criteria = Criteria {
            location_contains: Some("toronto".into()),
            before_date: None,
        };
        let records = vec![record("Toronto", 5, None)];
        assert_eq!(matching(&records, &criteria).len(), 1);
    }

    #[test]
    fn absent_location_criterion_matches_all_locations() {
        let criteria = Criteria::default();
        let records = vec![
            record("Toronto", 1, None),
            record("Ottawa", 2, None),
            record("Vancouver", 0, None),
        ];
        // Only the zero-count record drops out
        assert_eq!(matching(&records, &criteria).len(), 2);
    }

    #[test]
    fn order_is_preserved() {
        let records = vec![
            record("Toronto A", 1, Some("2026-01-03")),
            record("Toronto B", 1, Some("2026-01-01")),
            record("Toronto C", 1, Some("2026-01-02")),
        ];
        let matches = matching(&records, &toronto_before_march());
        let locations: Vec<_> = matches.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, ["Toronto A", "Toronto B", "Toronto C"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let criteria = toronto_before_march();
        let records = vec![
            record("Toronto", 2, Some("2026-01-01")),
            record("Ottawa", 2, Some("2026-01-01")),
            record("Toronto", 0, Some("2026-01-01")),
        ];
        let once = matching(&records, &criteria);
        let twice = matching(&once, &criteria);
        assert_eq!(once, twice);
    }
}
