//! Batch persister
//!
//! Collects tag updates and writes them to a [`TagStore`] one transaction per
//! batch. A batch is flushed as soon as the pending count reaches the batch
//! size; the caller flushes the final partial batch at end of input.
//!
//! A failed flush leaves every pending update in place so the caller can retry
//! or abort. The persister itself never retries.

use crate::store::{TagStore, TagUpdate};
use recipe_common::Result;
use tracing::debug;

/// Result of one committed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Updates in the committed batch
    pub records: usize,
    /// Rows the store reported as changed
    pub rows_affected: u64,
    /// Last update of the batch, for progress reporting
    pub example: Option<TagUpdate>,
}

pub struct BatchPersister<S> {
    store: S,
    batch_size: usize,
    pending: Vec<TagUpdate>,
    batches_committed: usize,
    records_committed: usize,
}

impl<S: TagStore> BatchPersister<S> {
    /// `batch_size` below 1 is treated as 1
    pub fn new(store: S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            batches_committed: 0,
            records_committed: 0,
        }
    }

    /// Queue one update, flushing when the batch is full
    ///
    /// Returns the flush outcome when this push completed a batch. On error
    /// the update stays queued together with the rest of the batch.
    pub async fn push(&mut self, update: TagUpdate) -> Result<Option<FlushOutcome>> {
        self.pending.push(update);

        if self.pending.len() >= self.batch_size {
            return self.flush().await.map(Some);
        }

        Ok(None)
    }

    /// Commit all pending updates as one transaction
    ///
    /// Flushing an empty queue is a no-op and does not count as a batch.
    pub async fn flush(&mut self) -> Result<FlushOutcome> {
        if self.pending.is_empty() {
            return Ok(FlushOutcome {
                records: 0,
                rows_affected: 0,
                example: None,
            });
        }

        let rows_affected = self.store.apply_batch(&self.pending).await?;

        let records = self.pending.len();
        let example = self.pending.pop();
        self.pending.clear();
        self.batches_committed += 1;
        self.records_committed += records;

        debug!(
            batch = self.batches_committed,
            records,
            rows_affected,
            "Committed tag batch"
        );

        Ok(FlushOutcome {
            records,
            rows_affected,
            example,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pending(&self) -> &[TagUpdate] {
        &self.pending
    }

    pub fn batches_committed(&self) -> usize {
        self.batches_committed
    }

    pub fn records_committed(&self) -> usize {
        self.records_committed
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recipe_common::Error;

    /// In-memory store that can be told to fail its next flushes
    #[derive(Default)]
    struct RecordingStore {
        batches: Vec<Vec<i64>>,
        fail_next: usize,
    }

    #[async_trait]
    impl TagStore for RecordingStore {
        async fn apply_batch(&mut self, updates: &[TagUpdate]) -> Result<u64> {
            if self.fail_next > 0 {
                self.fail_next -= 1;
                return Err(Error::InvalidInput("disk full".to_string()));
            }
            self.batches.push(updates.iter().map(|u| u.recipe_id).collect());
            Ok(updates.len() as u64)
        }
    }

    fn update(recipe_id: i64) -> TagUpdate {
        TagUpdate {
            recipe_id,
            tags: "general".to_string(),
            title: Some(format!("Recipe {}", recipe_id)),
        }
    }

    #[tokio::test]
    async fn test_flushes_when_batch_full() {
        let mut persister = BatchPersister::new(RecordingStore::default(), 3);

        assert!(persister.push(update(1)).await.unwrap().is_none());
        assert!(persister.push(update(2)).await.unwrap().is_none());
        let outcome = persister.push(update(3)).await.unwrap().expect("batch flushed");

        assert_eq!(outcome.records, 3);
        assert_eq!(outcome.rows_affected, 3);
        assert_eq!(outcome.example.map(|u| u.recipe_id), Some(3));
        assert!(persister.pending().is_empty());
        assert_eq!(persister.store().batches, vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn test_batch_count_is_ceiling() {
        for (records, batch_size, expected_batches) in [(0, 100, 0), (1, 100, 1), (100, 100, 1), (101, 100, 2), (250, 100, 3), (7, 1, 7)] {
            let mut persister = BatchPersister::new(RecordingStore::default(), batch_size);
            for id in 0..records {
                persister.push(update(id as i64)).await.unwrap();
            }
            persister.flush().await.unwrap();

            assert_eq!(persister.batches_committed(), expected_batches, "{} records / {}", records, batch_size);
            assert_eq!(persister.records_committed(), records);

            // Every record lands in exactly one batch, in order
            let committed: Vec<i64> = persister.into_store().batches.concat();
            assert_eq!(committed, (0..records as i64).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_pending() {
        let store = RecordingStore {
            fail_next: 1,
            ..Default::default()
        };
        let mut persister = BatchPersister::new(store, 2);

        persister.push(update(1)).await.unwrap();
        assert!(persister.push(update(2)).await.is_err());
        assert_eq!(persister.pending().len(), 2);
        assert_eq!(persister.batches_committed(), 0);
        assert_eq!(persister.records_committed(), 0);

        let outcome = persister.flush().await.unwrap();
        assert_eq!(outcome.records, 2);
        assert_eq!(persister.store().batches, vec![vec![1, 2]]);
    }

    #[tokio::test]
    async fn test_empty_flush_is_noop() {
        let mut persister = BatchPersister::new(RecordingStore::default(), 10);
        let outcome = persister.flush().await.unwrap();

        assert_eq!(outcome.records, 0);
        assert_eq!(persister.batches_committed(), 0);
        assert!(persister.store().batches.is_empty());
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        let persister = BatchPersister::new(RecordingStore::default(), 0);
        assert_eq!(persister.batch_size(), 1);
    }
}
