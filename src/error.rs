use crate::engine::EngineError;
use thiserror::Error;

/// Index error types
#[derive(Error, Debug)]
pub enum IndexError {
    /// The engine failed or could not be reached
    #[error("Engine communication error: {0}")]
    EngineCommunication(#[from] EngineError),

    /// A search attribute's pattern cannot be used with its match type
    #[error("Unsupported attribute type: {0}")]
    UnsupportedAttributeType(String),

    /// Batch entry submitted while no batch is open
    #[error("No active batch; call begin_batch first")]
    NoActiveBatch,

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl IndexError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            IndexError::EngineCommunication(_) => "ENGINE_COMMUNICATION",
            IndexError::UnsupportedAttributeType(_) => "UNSUPPORTED_ATTRIBUTE_TYPE",
            IndexError::NoActiveBatch => "NO_ACTIVE_BATCH",
            IndexError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
        }
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for IndexError {
    fn from(err: validator::ValidationErrors) -> Self {
        IndexError::InvalidConfiguration(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for IndexError {
    fn from(err: config::ConfigError) -> Self {
        IndexError::InvalidConfiguration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(IndexError::NoActiveBatch.error_code(), "NO_ACTIVE_BATCH");
        assert_eq!(
            IndexError::UnsupportedAttributeType("range".to_string()).error_code(),
            "UNSUPPORTED_ATTRIBUTE_TYPE"
        );
    }

    #[test]
    fn test_engine_errors_convert() {
        let err: IndexError = EngineError::SearchFailed("boom".to_string()).into();
        assert!(matches!(err, IndexError::EngineCommunication(_)));
        assert_eq!(err.to_string(), "Engine communication error: Search execution failed: boom");
    }
}
