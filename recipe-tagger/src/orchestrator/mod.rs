//! Tagging orchestrator
//!
//! Drives one run: pairs input records with stored rows, applies the skip
//! policy, classifies, hands updates to the [`BatchPersister`] and keeps the
//! [`RunStatistics`].
//!
//! # Processing model
//! Records are handled strictly in input order, one at a time. Storage is
//! only touched when a batch fills up or input ends; a record is counted as
//! tagged once its batch has committed, never before.
//!
//! # Failure handling
//! - An undecodable record is logged, counted as errored, and the run goes on.
//! - A failed flush is retried per [`RetryPolicy`]. When retries run out the
//!   run stops with [`TaggerError::FlushFailed`]; storage keeps every batch
//!   committed up to that point.

pub mod statistics;

pub use statistics::RunStatistics;

use crate::classifier::Classifier;
use crate::error::{Result, TaggerError};
use crate::normalize::normalize;
use crate::persister::{BatchPersister, FlushOutcome};
use crate::report::truncate_chars;
use crate::retry::RetryPolicy;
use crate::source::{CorrelatedRecord, RecipeRecord, SourceRecord};
use crate::store::{TagStore, TagUpdate};
use chrono::Utc;
use recipe_common::config::TaggingConfig;
use recipe_common::db::StoredRecipe;
use tracing::{debug, error, info, warn};

/// Records paired with stored rows, ready for a run
#[derive(Debug, Clone, Default)]
pub struct Correlation {
    pub records: Vec<CorrelatedRecord>,
    /// Records or rows left without a counterpart
    pub uncorrelated: usize,
}

impl Correlation {
    /// Records that already carry their storage id
    pub fn keyed(records: Vec<CorrelatedRecord>) -> Self {
        Self {
            records,
            uncorrelated: 0,
        }
    }
}

/// Pair the Nth record with the Nth stored row (ascending id)
///
/// This assumes the input has the same order and filtering as the ingestion
/// stage used when inserting rows. Pairing stops at the shorter sequence; the
/// surplus of either side is reported as uncorrelated.
pub fn correlate_by_position(stored: Vec<StoredRecipe>, records: Vec<SourceRecord>) -> Correlation {
    let (row_count, record_count) = (stored.len(), records.len());

    if row_count != record_count {
        warn!(
            rows = row_count,
            records = record_count,
            "Input and database sizes differ; only the first {} will be processed",
            row_count.min(record_count)
        );
    }

    let records = stored
        .into_iter()
        .zip(records)
        .map(|(stored, record)| CorrelatedRecord { stored, record })
        .collect();

    Correlation {
        records,
        uncorrelated: row_count.abs_diff(record_count),
    }
}

/// Run-level behaviour apart from classification policy and batch size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    pub min_text_chars: usize,
    pub only_untagged: bool,
    pub retry: RetryPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&TaggingConfig::default())
    }
}

impl From<&TaggingConfig> for RunOptions {
    fn from(config: &TaggingConfig) -> Self {
        Self {
            min_text_chars: config.min_text_chars,
            only_untagged: config.only_untagged,
            retry: RetryPolicy::new(config.flush_retries),
        }
    }
}

/// One tagging run over a correlated input
pub struct TaggingRun<'a, S> {
    classifier: Classifier<'a>,
    persister: BatchPersister<S>,
    options: RunOptions,
}

impl<'a, S: TagStore> TaggingRun<'a, S> {
    pub fn new(classifier: Classifier<'a>, store: S, batch_size: usize, options: RunOptions) -> Self {
        Self {
            classifier,
            persister: BatchPersister::new(store, batch_size),
            options,
        }
    }

    pub fn from_config(classifier: Classifier<'a>, store: S, config: &TaggingConfig) -> Self {
        Self::new(classifier, store, config.batch_size, RunOptions::from(config))
    }

    /// Normalize and classify one record
    ///
    /// Returns `None` when the record is skipped: both fields blank, or
    /// normalized text shorter than `min_text_chars`.
    pub fn prepare(&self, recipe_id: i64, record: &RecipeRecord) -> Option<TagUpdate> {
        if record.is_blank() {
            return None;
        }

        let text = normalize(record.title.as_deref(), record.ingredients.as_deref());
        if text.chars().count() < self.options.min_text_chars {
            return None;
        }

        let tags = self.classifier.classify(&text);

        Some(TagUpdate {
            recipe_id,
            tags: tags.encode(),
            title: record.title.clone(),
        })
    }

    /// Process every correlated record and commit all results
    pub async fn run(mut self, correlation: Correlation) -> Result<RunStatistics> {
        let mut stats = RunStatistics::new(correlation.uncorrelated);

        info!(
            batch_size = self.persister.batch_size(),
            only_untagged = self.options.only_untagged,
            "Starting rule-based classification of {} recipes",
            correlation.records.len()
        );

        for item in correlation.records {
            let recipe_id = item.stored.id;

            if self.options.only_untagged && item.stored.is_tagged() {
                stats.already_tagged += 1;
                continue;
            }

            stats.processed += 1;

            let record = match item.record {
                Ok(record) => record,
                Err(e) => {
                    warn!(recipe_id, error = %e, "Error processing recipe, skipping");
                    stats.errored += 1;
                    continue;
                }
            };

            let Some(update) = self.prepare(recipe_id, &record) else {
                debug!(recipe_id, "No usable title or ingredients, skipping");
                stats.skipped += 1;
                continue;
            };

            debug!(recipe_id, tags = %update.tags, "Classified recipe");

            match self.persister.push(update).await {
                Ok(Some(outcome)) => Self::record_commit(&mut stats, outcome),
                Ok(None) => {}
                Err(e) => self.retry_flush(&mut stats, e).await?,
            }
        }

        // Final partial batch
        match self.persister.flush().await {
            Ok(outcome) => Self::record_commit(&mut stats, outcome),
            Err(e) => self.retry_flush(&mut stats, e).await?,
        }

        stats.finished_at = Some(Utc::now());

        info!("Classification complete: {}", stats.display_string());

        Ok(stats)
    }

    fn record_commit(stats: &mut RunStatistics, outcome: FlushOutcome) {
        if outcome.records == 0 {
            return;
        }

        stats.tagged += outcome.records;
        stats.batches_committed += 1;

        info!(
            "Processed {} recipes... (Successfully tagged: {})",
            stats.processed, stats.tagged
        );

        if let Some(example) = outcome.example {
            info!(
                "  Example - Recipe {}: '{}...' -> {}",
                example.recipe_id,
                truncate_chars(example.title.as_deref().unwrap_or_default(), 50),
                example.tags
            );
        }
    }

    /// Retry the pending batch after `error`; abort when retries run out
    async fn retry_flush(&mut self, stats: &mut RunStatistics, error: recipe_common::Error) -> Result<()> {
        let policy = self.options.retry;
        let mut last_error = error;

        for retry in 1..=policy.max_retries {
            let wait = policy.backoff(retry);
            warn!(
                retry,
                pending = self.persister.pending().len(),
                wait_ms = wait.as_millis() as u64,
                error = %last_error,
                "Batch flush failed, retrying"
            );
            tokio::time::sleep(wait).await;

            match self.persister.flush().await {
                Ok(outcome) => {
                    Self::record_commit(stats, outcome);
                    return Ok(());
                }
                Err(e) => last_error = e,
            }
        }

        let pending = self.persister.pending().len();
        error!(
            attempts = policy.max_attempts(),
            pending,
            first_id = self.persister.pending().first().map(|u| u.recipe_id),
            "Giving up on batch; run aborted"
        );

        stats.finished_at = Some(Utc::now());

        Err(TaggerError::FlushFailed {
            attempts: policy.max_attempts(),
            pending,
            statistics: Box::new(stats.clone()),
            source: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RecordError;
    use async_trait::async_trait;
    use recipe_common::Error;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct StoreState {
        batches: Vec<Vec<TagUpdate>>,
        fail_next: usize,
        fail_from_batch: Option<usize>,
        flush_attempts: usize,
    }

    /// Store double sharing its state with the test
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<StoreState>>);

    impl SharedStore {
        fn failing(times: usize) -> Self {
            let store = Self::default();
            store.0.lock().unwrap().fail_next = times;
            store
        }

        fn committed(&self) -> Vec<TagUpdate> {
            self.0.lock().unwrap().batches.concat()
        }

        fn batch_count(&self) -> usize {
            self.0.lock().unwrap().batches.len()
        }
    }

    #[async_trait]
    impl TagStore for SharedStore {
        async fn apply_batch(&mut self, updates: &[TagUpdate]) -> recipe_common::Result<u64> {
            let mut state = self.0.lock().unwrap();
            state.flush_attempts += 1;
            if state.fail_from_batch.is_some_and(|n| state.batches.len() >= n) {
                return Err(Error::InvalidInput("disk I/O error".to_string()));
            }
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(Error::InvalidInput("database is locked".to_string()));
            }
            state.batches.push(updates.to_vec());
            Ok(updates.len() as u64)
        }
    }

    fn fast_options(max_retries: u32) -> RunOptions {
        RunOptions {
            retry: RetryPolicy {
                max_retries,
                initial_backoff: Duration::from_millis(1),
            },
            ..RunOptions::default()
        }
    }

    fn run_with(store: SharedStore, batch_size: usize, options: RunOptions) -> TaggingRun<'static, SharedStore> {
        TaggingRun::new(Classifier::standard(), store, batch_size, options)
    }

    fn keyed(items: Vec<(i64, Option<&str>, SourceRecord)>) -> Correlation {
        Correlation::keyed(
            items
                .into_iter()
                .map(|(id, tags, record)| CorrelatedRecord {
                    stored: StoredRecipe {
                        id,
                        tags: tags.map(str::to_string),
                    },
                    record,
                })
                .collect(),
        )
    }

    fn recipe(title: &str, ingredients: &str) -> SourceRecord {
        Ok(RecipeRecord::new(Some(title), Some(ingredients)))
    }

    #[tokio::test]
    async fn test_skip_policy_and_errors() {
        let store = SharedStore::default();
        let correlation = keyed(vec![
            (1, None, recipe("Chocolate Cake", "cocoa, sugar")),
            (2, None, Ok(RecipeRecord::new(None, None))),
            (3, None, recipe("  ", "")),
            (4, None, recipe("ab", "")),
            (5, None, recipe("!!", "??")),
            (
                6,
                None,
                Err(RecordError::Malformed {
                    line: 6,
                    message: "expected value".to_string(),
                }),
            ),
            (7, None, recipe("xyz unknown dish", "")),
        ]);

        let stats = run_with(store.clone(), 100, fast_options(0)).run(correlation).await.unwrap();

        assert_eq!(stats.processed, 7);
        assert_eq!(stats.tagged, 2);
        assert_eq!(stats.skipped, 4);
        assert_eq!(stats.errored, 1);
        assert_eq!(stats.batches_committed, 1);
        assert!(stats.finished_at.is_some());

        let committed = store.committed();
        assert_eq!(committed.len(), 2);
        assert_eq!(committed[0].recipe_id, 1);
        assert!(committed[0].tags.starts_with("dessert"));
        assert_eq!(committed[1].recipe_id, 7);
        assert_eq!(committed[1].tags, "general");
    }

    #[tokio::test]
    async fn test_batches_are_ceiling_of_tagged() {
        let store = SharedStore::default();
        let items = (1..=250)
            .map(|id| (id, None, recipe("Tomato soup", "tomatoes, basil")))
            .collect();

        let stats = run_with(store.clone(), 100, fast_options(0)).run(keyed(items)).await.unwrap();

        assert_eq!(stats.tagged, 250);
        assert_eq!(stats.batches_committed, 3);
        assert_eq!(store.batch_count(), 3);

        let ids: Vec<i64> = store.committed().iter().map(|u| u.recipe_id).collect();
        assert_eq!(ids, (1..=250).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_skipped_records_do_not_fill_batches() {
        let store = SharedStore::default();
        let mut items = Vec::new();
        for id in 1..=10 {
            let record = if id % 2 == 0 { recipe("", "") } else { recipe("Pancake stack", "eggs") };
            items.push((id, None, record));
        }

        let stats = run_with(store.clone(), 5, fast_options(0)).run(keyed(items)).await.unwrap();

        assert_eq!(stats.processed, 10);
        assert_eq!(stats.tagged, 5);
        assert_eq!(stats.skipped, 5);
        assert_eq!(stats.batches_committed, 1);
    }

    #[tokio::test]
    async fn test_only_untagged_resumes() {
        let store = SharedStore::default();
        let correlation = keyed(vec![
            (1, Some("dessert"), recipe("Chocolate Cake", "")),
            (2, Some(""), recipe("Green salad", "lettuce")),
            (3, None, recipe("Fried rice", "rice, soy sauce")),
        ]);
        let options = RunOptions {
            only_untagged: true,
            ..fast_options(0)
        };

        let stats = run_with(store.clone(), 100, options).run(correlation).await.unwrap();

        assert_eq!(stats.already_tagged, 1);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.tagged, 2);
        let ids: Vec<i64> = store.committed().iter().map(|u| u.recipe_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_transient_flush_failure_is_retried() {
        let store = SharedStore::failing(2);
        let items = (1..=4).map(|id| (id, None, recipe("Beef curry", "rice"))).collect();

        let stats = run_with(store.clone(), 3, fast_options(3)).run(keyed(items)).await.unwrap();

        assert_eq!(stats.tagged, 4);
        assert_eq!(stats.batches_committed, 2);
        assert_eq!(store.committed().len(), 4);
        assert_eq!(store.0.lock().unwrap().flush_attempts, 4);
    }

    #[tokio::test]
    async fn test_exhausted_retries_abort_with_statistics() {
        let store = SharedStore::failing(usize::MAX);
        let items = (1..=5).map(|id| (id, None, recipe("Beef curry", "rice"))).collect();

        let err = run_with(store.clone(), 2, fast_options(2)).run(keyed(items)).await.unwrap_err();

        match err {
            TaggerError::FlushFailed {
                attempts,
                pending,
                statistics,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(pending, 2);
                assert_eq!(statistics.processed, 2);
                assert_eq!(statistics.tagged, 0);
                assert!(statistics.finished_at.is_some());
            }
            other => panic!("Expected FlushFailed, got {:?}", other),
        }
        assert!(store.committed().is_empty());
        assert_eq!(store.0.lock().unwrap().flush_attempts, 3);
    }

    #[tokio::test]
    async fn test_tagged_counts_only_committed_batches() {
        let store = SharedStore::default();
        store.0.lock().unwrap().fail_from_batch = Some(2);
        let items = (1..=5).map(|id| (id, None, recipe("Beef curry", "rice"))).collect();

        // Batches [1,2] and [3,4] commit, the final [5] never does
        let err = run_with(store.clone(), 2, fast_options(1)).run(keyed(items)).await.unwrap_err();

        let TaggerError::FlushFailed { pending, statistics, .. } = err else {
            panic!("Expected FlushFailed");
        };
        assert_eq!(pending, 1);
        assert_eq!(statistics.processed, 5);
        assert_eq!(statistics.tagged, 4);
        assert_eq!(statistics.batches_committed, 2);
        assert_eq!(store.committed().len(), 4);
    }

    #[test]
    fn test_correlate_by_position_truncates() {
        let stored = |ids: &[i64]| {
            ids.iter()
                .map(|&id| StoredRecipe { id, tags: None })
                .collect::<Vec<_>>()
        };
        let records = |n: usize| (0..n).map(|i| recipe(&format!("Recipe {}", i), "")).collect::<Vec<_>>();

        let more_records = correlate_by_position(stored(&[10, 20]), records(5));
        assert_eq!(more_records.records.len(), 2);
        assert_eq!(more_records.uncorrelated, 3);
        assert_eq!(more_records.records[1].stored.id, 20);
        assert_eq!(more_records.records[1].record, recipe("Recipe 1", ""));

        let more_rows = correlate_by_position(stored(&[1, 2, 3, 4]), records(1));
        assert_eq!(more_rows.records.len(), 1);
        assert_eq!(more_rows.uncorrelated, 3);

        let equal = correlate_by_position(stored(&[1, 2]), records(2));
        assert_eq!(equal.uncorrelated, 0);
    }

    #[test]
    fn test_prepare_min_text_chars() {
        let store = SharedStore::default();
        let options = RunOptions {
            min_text_chars: 5,
            ..fast_options(0)
        };
        let run = run_with(store, 10, options);

        assert!(run.prepare(1, &RecipeRecord::new(Some("Tea"), None)).is_none());
        let update = run.prepare(2, &RecipeRecord::new(Some("Iced Tea"), None)).unwrap();
        assert_eq!(update.recipe_id, 2);
        assert!(update.tags.contains("drink"));
        assert_eq!(update.title.as_deref(), Some("Iced Tea"));
    }
}
