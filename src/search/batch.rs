//! Buffered bulk indexing
//!
//! Entries submitted between `begin` and `end` accumulate in a single buffer
//! slot. Each buffer carries a generation number; when a size limit is set,
//! the submission that finds the buffer full swaps in the next generation and
//! flushes the full one itself. The swap happens under the slot lock, so
//! every buffer is flushed exactly once and no submitter appends to a buffer
//! that has been handed off.

use crate::engine::{BulkRequest, EngineClient, UpdateRequest};
use crate::error::{IndexError, Result};
use crate::models::IndexEntry;
use crate::search::mapper;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

struct BatchBuffer {
    generation: u64,
    request: BulkRequest,
}

impl BatchBuffer {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            request: BulkRequest::new(),
        }
    }
}

/// Collects upserts into bulk writes against one index
pub struct BatchCoordinator<C> {
    client: Arc<C>,
    index: String,
    max_batch_size: Option<usize>,
    slot: Mutex<Option<BatchBuffer>>,
    generations: AtomicU64,
    /// One bulk write in flight at a time
    flush_gate: tokio::sync::Mutex<()>,
    flushes: AtomicU64,
    failed_operations: AtomicU64,
}

impl<C: EngineClient> BatchCoordinator<C> {
    pub fn new(client: Arc<C>, index: impl Into<String>, max_batch_size: Option<usize>) -> Self {
        Self {
            client,
            index: index.into(),
            max_batch_size: max_batch_size.filter(|max| *max > 0),
            slot: Mutex::new(None),
            generations: AtomicU64::new(0),
            flush_gate: tokio::sync::Mutex::new(()),
            flushes: AtomicU64::new(0),
            failed_operations: AtomicU64::new(0),
        }
    }

    fn next_buffer(&self) -> BatchBuffer {
        BatchBuffer::new(self.generations.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Open a fresh buffer. Operations still pending from an unfinished batch
    /// are flushed first.
    pub async fn begin(&self) -> Result<()> {
        let previous = {
            let mut slot = self.slot.lock();
            slot.replace(self.next_buffer())
        };

        match previous {
            Some(buffer) if !buffer.request.is_empty() => {
                debug!(
                    index = %self.index,
                    generation = buffer.generation,
                    "Batch restarted with pending operations"
                );
                self.flush(buffer).await
            }
            _ => Ok(()),
        }
    }

    /// Append an upsert for `entry`, flushing the buffer first if it is full.
    ///
    /// `entry` always lands in the open buffer before the full one is
    /// flushed. An `EngineCommunication` error here reports the lost full
    /// buffer; `entry` itself stays pending and must not be resubmitted.
    pub async fn submit(&self, entry: &IndexEntry) -> Result<()> {
        let operation =
            UpdateRequest::upsert(&self.index, &entry.reference, mapper::to_document(entry));

        let full = {
            let mut slot = self.slot.lock();
            let buffer = slot.as_mut().ok_or(IndexError::NoActiveBatch)?;

            let full = match self.max_batch_size {
                Some(max) if buffer.request.number_of_actions() >= max => {
                    Some(std::mem::replace(buffer, self.next_buffer()))
                }
                _ => None,
            };
            buffer.request.add(operation);
            full
        };

        match full {
            Some(buffer) => self.flush(buffer).await,
            None => Ok(()),
        }
    }

    /// Close the batch, flushing whatever it holds. Closing when no batch is
    /// open does nothing.
    pub async fn end(&self) -> Result<()> {
        let pending = self.slot.lock().take();

        match pending {
            Some(buffer) if !buffer.request.is_empty() => self.flush(buffer).await,
            _ => Ok(()),
        }
    }

    async fn flush(&self, buffer: BatchBuffer) -> Result<()> {
        let _gate = self.flush_gate.lock().await;
        let operations = buffer.request.number_of_actions();

        debug!(
            index = %self.index,
            generation = buffer.generation,
            operations,
            "Flushing batch"
        );

        let response = self.client.bulk(buffer.request).await.map_err(|e| {
            error!(
                index = %self.index,
                generation = buffer.generation,
                operations,
                error = %e,
                "Bulk write failed"
            );
            IndexError::from(e)
        })?;
        self.flushes.fetch_add(1, Ordering::Relaxed);

        if response.has_failures() {
            let failed = response.failures().count();
            self.failed_operations
                .fetch_add(failed as u64, Ordering::Relaxed);
            warn!(
                index = %self.index,
                generation = buffer.generation,
                operations,
                failed,
                failures = %response.failure_message(),
                "Bulk write partially failed"
            );
        }

        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Operations waiting in the open buffer
    pub fn pending_operations(&self) -> usize {
        self.slot
            .lock()
            .as_ref()
            .map_or(0, |buffer| buffer.request.number_of_actions())
    }

    /// Completed bulk writes
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Bulk items rejected by the engine
    pub fn failed_operations(&self) -> u64 {
        self.failed_operations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        BulkItemResponse, BulkResponse, EngineError, EngineResult, SearchRequest, SearchResponse,
    };
    use async_trait::async_trait;

    #[derive(Default)]
    struct BulkSizes {
        sizes: Mutex<Vec<usize>>,
        reject: Option<String>,
        unavailable: bool,
    }

    #[async_trait]
    impl EngineClient for BulkSizes {
        async fn update(&self, _request: UpdateRequest) -> EngineResult<()> {
            Ok(())
        }

        async fn bulk(&self, request: BulkRequest) -> EngineResult<BulkResponse> {
            if self.unavailable {
                return Err(EngineError::IndexingFailed("unavailable".into()));
            }
            self.sizes.lock().push(request.number_of_actions());

            let items = request
                .operations()
                .iter()
                .map(|op| match &self.reject {
                    Some(id) if *id == op.id => BulkItemResponse::failed(&op.id, "rejected"),
                    _ => BulkItemResponse::ok(&op.id),
                })
                .collect();
            Ok(BulkResponse { items, took_ms: 0 })
        }

        async fn search(&self, _request: SearchRequest) -> EngineResult<SearchResponse> {
            Ok(SearchResponse::default())
        }
    }

    fn entry(reference: usize) -> IndexEntry {
        let mut entry = IndexEntry::new(reference.to_string());
        entry.add_attr("n", reference as i64);
        entry
    }

    #[tokio::test]
    async fn test_submit_requires_open_batch() {
        let batch = BatchCoordinator::new(Arc::new(BulkSizes::default()), "test", None);
        let result = batch.submit(&entry(1)).await;
        assert!(matches!(result, Err(IndexError::NoActiveBatch)));
    }

    #[tokio::test]
    async fn test_size_limit_splits_flushes() {
        let engine = Arc::new(BulkSizes::default());
        let batch = BatchCoordinator::new(engine.clone(), "test", Some(3));

        batch.begin().await.unwrap();
        for i in 0..7 {
            batch.submit(&entry(i)).await.unwrap();
        }
        assert_eq!(batch.pending_operations(), 1);
        batch.end().await.unwrap();

        assert_eq!(*engine.sizes.lock(), vec![3, 3, 1]);
        assert_eq!(batch.flush_count(), 3);
        assert!(!batch.is_open());
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_flush() {
        let engine = Arc::new(BulkSizes::default());
        let batch = BatchCoordinator::new(engine.clone(), "test", Some(0));

        batch.begin().await.unwrap();
        batch.end().await.unwrap();
        batch.end().await.unwrap();

        assert!(engine.sizes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_begin_flushes_pending_operations() {
        let engine = Arc::new(BulkSizes::default());
        let batch = BatchCoordinator::new(engine.clone(), "test", None);

        batch.begin().await.unwrap();
        batch.submit(&entry(1)).await.unwrap();
        batch.submit(&entry(2)).await.unwrap();
        batch.begin().await.unwrap();

        assert_eq!(*engine.sizes.lock(), vec![2]);
        assert_eq!(batch.pending_operations(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_is_counted_not_raised() {
        let engine = Arc::new(BulkSizes {
            reject: Some("2".into()),
            ..Default::default()
        });
        let batch = BatchCoordinator::new(engine, "test", None);

        batch.begin().await.unwrap();
        for i in 1..=3 {
            batch.submit(&entry(i)).await.unwrap();
        }
        batch.end().await.unwrap();

        assert_eq!(batch.failed_operations(), 1);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let engine = Arc::new(BulkSizes {
            unavailable: true,
            ..Default::default()
        });
        let batch = BatchCoordinator::new(engine, "test", None);

        batch.begin().await.unwrap();
        batch.submit(&entry(1)).await.unwrap();
        let result = batch.end().await;

        assert!(matches!(result, Err(IndexError::EngineCommunication(_))));
        assert_eq!(batch.flush_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_triggering_entry_pending() {
        let engine = Arc::new(BulkSizes {
            unavailable: true,
            ..Default::default()
        });
        let batch = BatchCoordinator::new(engine, "test", Some(2));

        batch.begin().await.unwrap();
        batch.submit(&entry(1)).await.unwrap();
        batch.submit(&entry(2)).await.unwrap();
        let result = batch.submit(&entry(3)).await;

        assert!(matches!(result, Err(IndexError::EngineCommunication(_))));
        assert_eq!(batch.pending_operations(), 1);
        assert!(batch.is_open());
    }
}
