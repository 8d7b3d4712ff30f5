//! Per-run counters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Counters updated by every stage of a run.
///
/// `classified` keeps categories in declaration order so reports are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Regular files yielded by the scanner.
    pub scanned: u64,
    /// Files assigned to each category.
    pub classified: IndexMap<String, u64>,
    /// Files that reached no category.
    pub unclassified: u64,
    /// Files whose content matched an earlier file.
    pub duplicates_found: u64,
    /// Files moved or copied (or that would be, in a dry run).
    pub moved: u64,
    /// Files deliberately left in place.
    pub skipped: u64,
    /// Recoverable per-file failures.
    pub errors: u64,
    /// Bytes moved or copied.
    pub bytes_moved: u64,
}

impl RunStatistics {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create stats with a zeroed counter for each category.
    pub fn with_categories<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            classified: categories
                .into_iter()
                .map(|c| (c.to_string(), 0))
                .collect(),
            ..Self::default()
        }
    }

    /// Record a scanned file.
    pub fn record_scanned(&mut self) {
        self.scanned += 1;
    }

    /// Record a classification outcome (`None` means unclassified).
    pub fn record_classified(&mut self, category: Option<&str>) {
        match category {
            Some(name) => *self.classified.entry(name.to_string()).or_insert(0) += 1,
            None => self.unclassified += 1,
        }
    }

    /// Record a detected duplicate.
    pub fn record_duplicate(&mut self) {
        self.duplicates_found += 1;
    }

    /// Record a completed (or simulated) move or copy.
    pub fn record_moved(&mut self, bytes: u64) {
        self.moved += 1;
        self.bytes_moved += bytes;
    }

    /// Record a skipped file.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Record a recoverable error.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Total files assigned to a category.
    pub fn total_classified(&self) -> u64 {
        self.classified.values().sum()
    }

    /// Check if any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = RunStatistics::default();
        assert_eq!(stats.scanned, 0);
        assert_eq!(stats.total_classified(), 0);
        assert!(!stats.has_errors());
    }

    #[test]
    fn test_categories_keep_declaration_order() {
        let mut stats = RunStatistics::with_categories(["Zeta", "Alpha"]);
        stats.record_classified(Some("Alpha"));
        stats.record_classified(Some("Alpha"));
        stats.record_classified(None);

        let keys: Vec<&String> = stats.classified.keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
        assert_eq!(stats.classified["Alpha"], 2);
        assert_eq!(stats.classified["Zeta"], 0);
        assert_eq!(stats.unclassified, 1);
        assert_eq!(stats.total_classified(), 2);
    }

    #[test]
    fn test_record_moved_tracks_bytes() {
        let mut stats = RunStatistics::new();
        stats.record_moved(100);
        stats.record_moved(28);
        assert_eq!(stats.moved, 2);
        assert_eq!(stats.bytes_moved, 128);
    }
}
