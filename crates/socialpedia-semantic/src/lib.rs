// Semantic search for Socialpedia
//
// Ranks posts, events and users by meaning rather than keywords: every
// candidate is projected to a comparison text, embedded, scored against
// the query with cosine similarity, filtered by a threshold and sorted.

pub mod cache;
pub mod embeddings;
pub mod error;
pub mod models;
pub mod projection;
pub mod ranking;
pub mod similarity;

// Re-export main types
pub use cache::CachedProvider;
pub use embeddings::{EmbeddingProvider, FastEmbedProvider};
pub use error::{Result, SemanticError};
pub use models::{RankOutcome, RankStats, ScoredRecord};
pub use projection::{FieldProjector, ProjectionRule};
pub use ranking::RankingEngine;
pub use similarity::{cosine_similarity, Threshold};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_imports() {
        let config = socialpedia_core::SearchConfig::default();
        let _ = FieldProjector::new(ProjectionRule::from_config(&config));
    }
}
