//! Common test utilities for index testing
//!
//! Provides a recording engine for asserting on the requests the facade
//! sends, and a Tantivy-backed fixture index holding three sample entries.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use search_proxy::engine::{
    BulkItemResponse, BulkRequest, BulkResponse, EngineClient, EngineError, EngineResult,
    FieldMapping, Hit, SearchRequest, SearchResponse, TantivyEngine, UpdateRequest,
};
use search_proxy::models::IndexEntry;
use search_proxy::search::{EngineIndex, Index, IndexSettings, IndexSettingsBuilder};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const INDEX_NAME: &str = "test_index";

/// Engine that records every request and answers searches with canned hits
#[derive(Default)]
pub struct RecordingEngine {
    pub updates: Mutex<Vec<UpdateRequest>>,
    pub bulks: Mutex<Vec<BulkRequest>>,
    pub searches: Mutex<Vec<SearchRequest>>,
    pub canned_hits: Mutex<Vec<Hit>>,
    pub rejected_ids: Mutex<HashSet<String>>,
    pub unavailable: AtomicBool,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn reject(&self, id: &str) {
        self.rejected_ids.lock().insert(id.to_string());
    }

    pub fn set_hits(&self, hits: Vec<Hit>) {
        *self.canned_hits.lock() = hits;
    }

    /// Sizes of the recorded bulk requests, in arrival order
    pub fn bulk_sizes(&self) -> Vec<usize> {
        self.bulks
            .lock()
            .iter()
            .map(BulkRequest::number_of_actions)
            .collect()
    }

    /// Ids of every bulk operation received
    pub fn bulk_ids(&self) -> Vec<String> {
        self.bulks
            .lock()
            .iter()
            .flat_map(|bulk| bulk.operations().iter().map(|op| op.id.clone()))
            .collect()
    }

    pub fn last_search(&self) -> Option<SearchRequest> {
        self.searches.lock().last().cloned()
    }

    fn check_available(&self) -> EngineResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::SearchFailed("engine unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EngineClient for RecordingEngine {
    async fn update(&self, request: UpdateRequest) -> EngineResult<()> {
        self.check_available()?;
        self.updates.lock().push(request);
        Ok(())
    }

    async fn bulk(&self, request: BulkRequest) -> EngineResult<BulkResponse> {
        self.check_available()?;

        let rejected = self.rejected_ids.lock().clone();
        let items = request
            .operations()
            .iter()
            .map(|op| {
                if rejected.contains(&op.id) {
                    BulkItemResponse::failed(&op.id, "mapper_parsing_exception")
                } else {
                    BulkItemResponse::ok(&op.id)
                }
            })
            .collect();

        self.bulks.lock().push(request);
        Ok(BulkResponse { items, took_ms: 0 })
    }

    async fn search(&self, request: SearchRequest) -> EngineResult<SearchResponse> {
        self.check_available()?;
        self.searches.lock().push(request);

        let hits = self.canned_hits.lock().clone();
        Ok(SearchResponse {
            total_hits: hits.len(),
            hits,
            took_ms: 0,
        })
    }
}

pub fn settings(max_batch_size: i64) -> IndexSettings {
    IndexSettingsBuilder::new(INDEX_NAME)
        .wildcard_fields(["name", "desc", "ident"])
        .max_batch_size(max_batch_size)
        .build()
}

pub fn recording_index(max_batch_size: i64) -> (Arc<RecordingEngine>, EngineIndex<RecordingEngine>) {
    let engine = RecordingEngine::new();
    let index = EngineIndex::new(engine.clone(), settings(max_batch_size)).unwrap();
    (engine, index)
}

pub fn field_mappings() -> Vec<FieldMapping> {
    vec![
        FieldMapping::text("name"),
        FieldMapping::text("desc"),
        FieldMapping::text("ident"),
        FieldMapping::integer("somenumber"),
    ]
}

/// Helper to create a test entry
pub fn create_test_entry(reference: &str, name: &str, desc: &str, ident: &str) -> IndexEntry {
    let mut entry = IndexEntry::new(reference);
    entry
        .add_text_attr("name", name)
        .add_text_attr("desc", desc)
        .add_text_attr("ident", ident);
    entry
}

pub fn sample_entries() -> Vec<IndexEntry> {
    let mut bob = create_test_entry("1", "bob the dogs", "bob is a very big dog that eats food", "1234");
    bob.add_attr("somenumber", 56);

    let mut bog = create_test_entry(
        "2",
        "dog the bog",
        "this is a place where dogs velocity is reduced via viscosity",
        "6789",
    );
    bog.add_attr("somenumber", 56);

    let mut butter = create_test_entry(
        "3",
        "nut butter",
        "a delicious substance, sometimes liked by dogs",
        "1011",
    );
    butter.add_attr("somenumber", "57");

    vec![bob, bog, butter]
}

/// In-memory Tantivy index loaded with the sample entries through a batch
pub async fn fixture_index() -> EngineIndex<TantivyEngine> {
    let engine = Arc::new(TantivyEngine::in_memory(field_mappings()));
    let index = EngineIndex::new(engine, settings(0)).unwrap();

    index.begin_batch().await.unwrap();
    for entry in sample_entries() {
        index.submit_batch_entry(&entry).await.unwrap();
    }
    index.end_batch().await.unwrap();

    index
}
