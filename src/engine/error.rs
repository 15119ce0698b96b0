//! Error types for engine operations

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised while talking to a search engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Index could not be opened or created
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// The engine refused a document
    #[error("Document {id} rejected: {reason}")]
    DocumentRejected { id: String, reason: String },

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Write or commit failed
    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tantivy error
    #[error("Tantivy error: {0}")]
    Tantivy(String),
}

impl From<tantivy::TantivyError> for EngineError {
    fn from(err: tantivy::TantivyError) -> Self {
        EngineError::Tantivy(err.to_string())
    }
}
