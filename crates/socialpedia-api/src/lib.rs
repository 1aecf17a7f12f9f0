// HTTP clients for external services the search engine leans on
pub mod embeddings;
pub mod retry;

pub use embeddings::{ApiError, EmbeddingClient};
pub use retry::RetryConfig;
