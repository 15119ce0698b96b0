use crate::models::entry::IndexEntry;
use serde::{Deserialize, Serialize};

/// One ranked match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Relevance score reported by the engine
    pub score: f32,

    /// The matched document
    pub index_entry: IndexEntry,
}

/// Matches for a query, in the order the engine ranked them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub matches: Vec<SearchResultItem>,

    /// Position after the last returned match; use as the next `from`
    pub last_index: usize,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// References of the matches, in rank order
    pub fn references(&self) -> Vec<&str> {
        self.matches
            .iter()
            .map(|item| item.index_entry.reference.as_str())
            .collect()
    }
}

/// Index statistics. Backends fill in what they can report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<usize>,

    /// Operations buffered in the open batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_batch_operations: Option<usize>,

    /// Bulk items the engine rejected since startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_bulk_operations: Option<u64>,
}
