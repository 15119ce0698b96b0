//! Requests and responses exchanged with a search engine

use crate::engine::query::EngineQuery;
use crate::models::Sort;
use serde::{Deserialize, Serialize};

/// A stored document: field name to JSON value
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Partial update of one document, inserting it when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub index: String,

    /// Engine document id
    pub id: String,

    /// Fields to merge into the stored document
    pub doc: Document,

    /// Insert `doc` as a new document when `id` does not exist
    pub doc_as_upsert: bool,
}

impl UpdateRequest {
    pub fn upsert(index: impl Into<String>, id: impl Into<String>, doc: Document) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            doc,
            doc_as_upsert: true,
        }
    }
}

/// Ordered group of updates sent as one engine call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkRequest {
    operations: Vec<UpdateRequest>,
}

impl BulkRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, request: UpdateRequest) -> &mut Self {
        self.operations.push(request);
        self
    }

    pub fn number_of_actions(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[UpdateRequest] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<UpdateRequest> {
        self.operations
    }
}

/// Outcome of one bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResponse {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl BulkItemResponse {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            failure: None,
        }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            failure: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Per-item outcomes of a bulk call, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub items: Vec<BulkItemResponse>,
    pub took_ms: u64,
}

impl BulkResponse {
    pub fn has_failures(&self) -> bool {
        self.items.iter().any(BulkItemResponse::is_failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResponse> {
        self.items.iter().filter(|item| item.is_failed())
    }

    /// One line per failed item, for logging
    pub fn failure_message(&self) -> String {
        self.failures()
            .map(|item| format!("[{}]: {}", item.id, item.failure.as_deref().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Query execution parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index: String,

    pub query: EngineQuery,

    /// Maximum number of hits to return
    pub size: usize,

    /// Number of qualifying hits to skip
    #[serde(default)]
    pub from: usize,

    /// Hits scoring below this are dropped before paging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, query: EngineQuery) -> Self {
        Self {
            index: index.into(),
            query,
            size: 10,
            from: 0,
            min_score: None,
            sort: None,
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn sort(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }
}

/// A ranked document returned by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub score: f32,
    pub source: Document,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,

    /// Documents that matched and passed the score floor, before paging
    pub total_hits: usize,

    pub took_ms: u64,
}

/// Engine-side statistics for one index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub document_count: u64,
    pub segment_count: usize,
}
