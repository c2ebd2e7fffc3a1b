use std::collections::VecDeque;

use super::models::RoundRecord;

pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first log of detected rounds, bounded to `HISTORY_CAPACITY`.
///
/// Ordering follows detection, not round date. A batch keeps its source order
/// at the front of the log.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: VecDeque<RoundRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn append(&mut self, records: &[RoundRecord]) {
        for record in records.iter().rev() {
            self.entries.push_front(record.clone());
        }
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn list(&self) -> Vec<RoundRecord> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(n: usize) -> RoundRecord {
        RoundRecord {
            date: format!("2025-08-{n:02}"),
            category: format!("Round {n}"),
            invitation_count: n as u32,
            streams: Vec::new(),
            min_score: None,
            description: String::new(),
        }
    }

    fn categories(log: &HistoryLog) -> Vec<String> {
        log.list().into_iter().map(|r| r.category).collect()
    }

    #[test]
    fn test_newest_batch_first_in_source_order() {
        let mut log = HistoryLog::new();
        log.append(&[round(1), round(2)]);
        log.append(&[round(3), round(4)]);
        assert_eq!(categories(&log), vec!["Round 3", "Round 4", "Round 1", "Round 2"]);
    }

    #[test]
    fn test_never_exceeds_capacity_and_evicts_oldest() {
        let mut log = HistoryLog::new();
        for n in 1..=25 {
            log.append(&[round(n)]);
            assert!(log.len() <= HISTORY_CAPACITY);
        }
        let list = categories(&log);
        assert_eq!(list.len(), HISTORY_CAPACITY);
        assert_eq!(list.first().map(String::as_str), Some("Round 25"));
        assert_eq!(list.last().map(String::as_str), Some("Round 16"));
    }

    #[test]
    fn test_oversized_batch_keeps_its_leading_records() {
        let mut log = HistoryLog::new();
        let batch: Vec<RoundRecord> = (1..=12).map(round).collect();
        log.append(&batch);
        let list = categories(&log);
        assert_eq!(list.len(), HISTORY_CAPACITY);
        assert_eq!(list[0], "Round 1");
        assert_eq!(list[9], "Round 10");
    }

    #[test]
    fn test_clear() {
        let mut log = HistoryLog::new();
        log.append(&[round(1)]);
        log.clear();
        assert!(log.is_empty());
    }
}
