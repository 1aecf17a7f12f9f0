use thiserror::Error;

/// Everything that can go wrong outside the ranking engine itself
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported collection '{0}'. Use 'posts' or 'users'.")]
    UnsupportedCollection(String),

    #[error("Record store failed: {0}")]
    StoreError(String),

    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Export failed: {0}")]
    ExportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
