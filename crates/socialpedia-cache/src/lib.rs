// SQLite-backed embedding cache
// Lets repeated searches skip re-embedding records whose text has not changed

pub mod cache;

pub use cache::{CacheError, CacheStats, EmbeddingCache};
