//! Decides which fetched rounds have not been seen before.
//!
//! Keys are marked as seen here, before any notification is attempted. The
//! monitor therefore delivers at most once per round: a notifier failure does
//! not cause the same round to be re-sent on the next poll. Callers wanting
//! at-least-once delivery must only persist the returned key set after a
//! successful send, and accept duplicate alerts on retry.

use std::collections::BTreeSet;

use super::models::{RoundKey, RoundRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Unseen rounds, in the order the source returned them.
    pub new_records: Vec<RoundRecord>,
    pub seen_keys: BTreeSet<RoundKey>,
}

pub fn diff(fetched: &[RoundRecord], seen_keys: &BTreeSet<RoundKey>) -> ChangeSet {
    let mut updated = seen_keys.clone();
    let new_records = fetched
        .iter()
        .filter(|record| updated.insert(record.key()))
        .cloned()
        .collect();

    ChangeSet {
        new_records,
        seen_keys: updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(date: &str, category: &str, invitations: u32) -> RoundRecord {
        RoundRecord {
            date: date.to_string(),
            category: category.to_string(),
            invitation_count: invitations,
            streams: vec!["Foreign Worker".to_string()],
            min_score: Some(53),
            description: "...".to_string(),
        }
    }

    #[test]
    fn test_first_sighting_is_new_and_marked_seen() {
        let fetched = vec![round("2025-08-28", "Employer Job Offer", 348)];
        let changes = diff(&fetched, &BTreeSet::new());

        assert_eq!(changes.new_records, fetched);
        assert_eq!(changes.seen_keys.len(), 1);
        assert!(
            changes
                .seen_keys
                .contains(&RoundKey::new("2025-08-28", "Employer Job Offer"))
        );

        let again = diff(&fetched, &changes.seen_keys);
        assert!(again.new_records.is_empty());
        assert_eq!(again.seen_keys, changes.seen_keys);
    }

    #[test]
    fn test_only_unseen_records_returned_in_source_order() {
        let seen: BTreeSet<RoundKey> = [RoundKey::new("2025-08-20", "Express Entry")]
            .into_iter()
            .collect();
        let fetched = vec![
            round("2025-09-02", "Masters Graduate", 120),
            round("2025-08-20", "Express Entry", 1235),
            round("2025-08-28", "Employer Job Offer", 348),
        ];

        let changes = diff(&fetched, &seen);

        let categories: Vec<&str> = changes
            .new_records
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Masters Graduate", "Employer Job Offer"]);
        assert_eq!(changes.seen_keys.len(), seen.len() + 2);
    }

    #[test]
    fn test_revised_counts_do_not_make_a_round_new() {
        let first = vec![round("2025-08-28", "Employer Job Offer", 348)];
        let seen = diff(&first, &BTreeSet::new()).seen_keys;

        let revised = vec![round("2025-08-28", "Employer Job Offer", 400)];
        assert!(diff(&revised, &seen).new_records.is_empty());
    }

    #[test]
    fn test_same_date_different_category_is_distinct() {
        let seen = diff(&[round("2025-08-28", "Employer Job Offer", 348)], &BTreeSet::new())
            .seen_keys;
        let changes = diff(&[round("2025-08-28", "In-Demand Skills", 90)], &seen);
        assert_eq!(changes.new_records.len(), 1);
    }

    #[test]
    fn test_empty_fetch_leaves_state_untouched() {
        let seen: BTreeSet<RoundKey> = [RoundKey::new("2025-08-20", "Express Entry")]
            .into_iter()
            .collect();
        let changes = diff(&[], &seen);
        assert!(changes.new_records.is_empty());
        assert_eq!(changes.seen_keys, seen);
    }
}
