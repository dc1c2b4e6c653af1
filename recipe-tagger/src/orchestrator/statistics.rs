//! Run statistics
//!
//! Accumulated by value through the record loop and returned to the caller;
//! nothing here is global.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one tagging run
///
/// `processed = tagged + skipped + errored + pending`, where pending records
/// were classified but their batch never committed (only possible when the
/// run aborted). Rows left alone by resume mode count as `already_tagged`,
/// input beyond the shorter of the two correlated sequences as
/// `uncorrelated`; neither is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Records visited by the pipeline
    pub processed: usize,
    /// Records whose tags are committed to storage
    pub tagged: usize,
    /// Blank records or normalized text below the minimum length
    pub skipped: usize,
    /// Records that could not be decoded
    pub errored: usize,
    /// Rows that already had tags (resume mode)
    pub already_tagged: usize,
    /// Records or rows without a counterpart
    pub uncorrelated: usize,
    /// Committed transactions
    pub batches_committed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatistics {
    pub fn new(uncorrelated: usize) -> Self {
        Self {
            processed: 0,
            tagged: 0,
            skipped: 0,
            errored: 0,
            already_tagged: 0,
            uncorrelated,
            batches_committed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Processed records that did not end up tagged
    pub fn not_tagged(&self) -> usize {
        self.processed.saturating_sub(self.tagged)
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} processed, {} tagged, {} skipped, {} errored, {} already tagged, {} uncorrelated, {} batches",
            self.processed,
            self.tagged,
            self.skipped,
            self.errored,
            self.already_tagged,
            self.uncorrelated,
            self.batches_committed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string() {
        let stats = RunStatistics {
            processed: 10,
            tagged: 7,
            skipped: 2,
            errored: 1,
            batches_committed: 1,
            ..RunStatistics::new(3)
        };

        assert_eq!(
            stats.display_string(),
            "10 processed, 7 tagged, 2 skipped, 1 errored, 0 already tagged, 3 uncorrelated, 1 batches"
        );
        assert_eq!(stats.not_tagged(), 3);
        assert_eq!(stats.elapsed_ms(), None);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = RunStatistics::new(0);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["processed"], 0);
        assert!(json["started_at"].is_string());
        assert!(json["finished_at"].is_null());
    }
}
