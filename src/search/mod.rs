//! Index facade over a full-text engine
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Index (EngineIndex)                   │
//! ├─────────────────────────────────────────────────┤
//! │  - submit_single_entry()  - search_text()       │
//! │  - begin/submit/end batch - search()            │
//! │  - fetch_metrics()        - clear_index()       │
//! └─────────────────────────────────────────────────┘
//!          │                        │
//!          ▼                        ▼
//! ┌──────────────────┐   ┌──────────────────────────┐
//! │ BatchCoordinator │   │ QueryCompiler            │
//! │  buffer + flush  │   │  attributes → OR query   │
//! └──────────────────┘   └──────────────────────────┘
//!          │                        │
//!          ▼                        ▼
//! ┌─────────────────────────────────────────────────┐
//! │           EngineClient (e.g. TantivyEngine)     │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use search_proxy::engine::{FieldMapping, TantivyEngine};
//! use search_proxy::models::{IndexEntry, SearchQuery};
//! use search_proxy::search::{EngineIndex, Index, IndexSettingsBuilder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(TantivyEngine::in_memory(vec![FieldMapping::text("name")]));
//!     let settings = IndexSettingsBuilder::new("entries")
//!         .wildcard_fields(["name"])
//!         .build();
//!     let index = EngineIndex::new(engine, settings)?;
//!
//!     let mut entry = IndexEntry::new("1");
//!     entry.add_text_attr("name", "bob the dogs");
//!     index.submit_single_entry(&entry).await?;
//!
//!     let results = index.search(&SearchQuery::new().with("*", "dog")).await?;
//!     println!("Found {} entries", results.len());
//!
//!     Ok(())
//! }
//! ```

mod batch;
mod compiler;
mod config;
mod engine_index;
pub mod mapper;

pub use batch::BatchCoordinator;
pub use compiler::{QueryCompiler, MIN_SCORE, OVER_FETCH_FACTOR};
pub use config::{IndexSettings, IndexSettingsBuilder};
pub use engine_index::EngineIndex;

use crate::error::Result;
use crate::models::{IndexEntry, IndexMetrics, SearchQuery, SearchResult};
use async_trait::async_trait;

/// A searchable store of [`IndexEntry`] documents
#[async_trait]
pub trait Index: Send + Sync {
    /// Upsert one entry immediately, keyed by its reference
    async fn submit_single_entry(&self, entry: &IndexEntry) -> Result<()>;

    /// Start buffering entries for bulk writes
    async fn begin_batch(&self) -> Result<()>;

    /// Buffer an upsert; fails with `NoActiveBatch` outside a batch
    async fn submit_batch_entry(&self, entry: &IndexEntry) -> Result<()>;

    /// Flush buffered entries and close the batch
    async fn end_batch(&self) -> Result<()>;

    /// Free-text search across all fields, ranked by engine relevance
    async fn search_text(&self, text: &str, max_results: usize) -> Result<SearchResult>;

    /// Attribute search: over-fetches `2 × limit` candidates and drops those
    /// scoring under [`MIN_SCORE`]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResult>;

    async fn fetch_metrics(&self) -> Result<IndexMetrics>;

    /// Remove every entry; does nothing when the engine cannot clear
    async fn clear_index(&self) -> Result<()>;
}
