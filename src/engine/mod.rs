//! Search engine boundary
//!
//! The index facade talks to a concrete engine only through [`EngineClient`].
//! Requests are engine-neutral: documents are JSON maps keyed by the caller's
//! reference, and queries are [`EngineQuery`] trees built by the query
//! compiler.
//!
//! [`TantivyEngine`] is the bundled backend. It keeps one Tantivy index per
//! index name, either on disk or in memory.

mod error;
mod query;
mod request;
mod tantivy_engine;

pub use error::{EngineError, EngineResult};
pub use query::{BoolQuery, EngineQuery, Fuzziness, RangeQuery};
pub use request::{
    BulkItemResponse, BulkRequest, BulkResponse, Document, EngineStats, Hit, SearchRequest,
    SearchResponse, UpdateRequest,
};
pub use tantivy_engine::{FieldKind, FieldMapping, TantivyEngine, TantivyEngineConfig};

use async_trait::async_trait;

/// Operations a search engine must provide to back an index
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Merge one document into the index, inserting it when absent
    async fn update(&self, request: UpdateRequest) -> EngineResult<()>;

    /// Apply a group of updates. Individual item failures are reported in
    /// the response rather than as an error.
    async fn bulk(&self, request: BulkRequest) -> EngineResult<BulkResponse>;

    /// Execute a query
    async fn search(&self, request: SearchRequest) -> EngineResult<SearchResponse>;

    /// Index statistics, if the engine reports any
    async fn stats(&self, _index: &str) -> EngineResult<Option<EngineStats>> {
        Ok(None)
    }

    /// Remove every document from the index
    async fn clear(&self, _index: &str) -> EngineResult<()> {
        Ok(())
    }
}
