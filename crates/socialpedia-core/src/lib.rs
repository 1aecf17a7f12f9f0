// Data model, configuration and storage plumbing shared by every crate
pub mod boundary;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod store;

pub use config::{
    CacheConfig, Config, EmbeddingBackend, EmbeddingConfig, ProjectionMode, SearchConfig,
    StoreConfig,
};
pub use error::Error;
pub use export::{ExportFormat, Exporter};
pub use models::{Collection, Record, RecordKind};
pub use store::{JsonFileStore, MemoryStore, RecordStore};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
