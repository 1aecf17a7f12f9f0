use thiserror::Error;

/// Result type for semantic search operations
pub type Result<T> = std::result::Result<T, SemanticError>;

/// Errors that can occur during semantic search operations
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding provider failed: {0}")]
    ProviderFailure(String),

    #[error("Embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to load embedding model: {0}")]
    ModelLoadError(String),

    #[error("Model not initialized. Call initialize() first.")]
    ModelNotInitialized,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<socialpedia_core::Error> for SemanticError {
    fn from(err: socialpedia_core::Error) -> Self {
        SemanticError::ConfigError(err.to_string())
    }
}

impl From<socialpedia_api::ApiError> for SemanticError {
    fn from(err: socialpedia_api::ApiError) -> Self {
        SemanticError::ProviderFailure(err.to_string())
    }
}
