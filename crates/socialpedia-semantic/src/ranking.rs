use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, SemanticError};
use crate::models::{RankOutcome, RankStats, ScoredRecord};
use crate::projection::{FieldProjector, ProjectionRule};
use crate::similarity::{cosine_similarity, Threshold};
use futures::stream::{self, StreamExt};
use socialpedia_core::{Record, SearchConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ranks records by semantic closeness to a query.
///
/// Stateless between calls: every search embeds the query once and every
/// candidate record once. Per-record embedding runs with bounded
/// concurrency; results are collected in input order before sorting, so
/// ties keep their input order however the calls complete.
pub struct RankingEngine {
    provider: Arc<dyn EmbeddingProvider>,
    projector: FieldProjector,
    threshold: Threshold,
    config: SearchConfig,
}

impl RankingEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: SearchConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            provider,
            projector: FieldProjector::new(ProjectionRule::from_config(&config)),
            threshold: Threshold::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn projector(&self) -> &FieldProjector {
        &self.projector
    }

    /// Ranked matches only
    pub async fn search(&self, query: &str, records: &[Record]) -> Result<Vec<ScoredRecord>> {
        Ok(self.rank(query, records).await?.results)
    }

    /// Rank `records` against `query`.
    ///
    /// Records without comparable text are skipped. A record whose embedding
    /// fails is left out and counted; the call only fails when the query
    /// cannot be embedded or every candidate failed. Dropping the returned
    /// future cancels any embedding calls still in flight.
    pub async fn rank(&self, query: &str, records: &[Record]) -> Result<RankOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SemanticError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        debug!("Semantic search query: {}", query);

        let mut stats = RankStats {
            total: records.len(),
            ..Default::default()
        };

        let candidates: Vec<(&Record, String)> = records
            .iter()
            .filter_map(|record| self.projector.project(record).map(|text| (record, text)))
            .collect();
        stats.skipped_empty = records.len() - candidates.len();

        if candidates.is_empty() {
            debug!("No records with comparable text");
            return Ok(RankOutcome {
                stats,
                ..Default::default()
            });
        }

        let query_vector = self.provider.embed(query).await.map_err(|e| {
            SemanticError::ServiceUnavailable(format!("could not embed query: {}", e))
        })?;

        debug!(
            "Scoring {} candidates ({} skipped without text)",
            candidates.len(),
            stats.skipped_empty
        );

        // `buffered` yields in input order no matter which call finishes first
        let scores: Vec<(&Record, Result<f32>)> = stream::iter(candidates)
            .map(|(record, text)| {
                let query_vector = &query_vector;
                async move { (record, self.score_text(query_vector, &text).await) }
            })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut results = Vec::new();
        let mut last_error = None;

        for (record, score) in scores {
            match score {
                Ok(similarity) if self.threshold.admits(similarity) => {
                    results.push(ScoredRecord::new(record, similarity));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping record, embedding failed: {}", e);
                    stats.failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if stats.failed == stats.candidates() {
            let cause = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(SemanticError::ServiceUnavailable(format!(
                "all {} records failed to embed: {}",
                stats.failed, cause
            )));
        }

        let warning = if stats.failure_ratio() > self.config.max_failure_ratio {
            let message = format!(
                "{} of {} records could not be embedded; results may be incomplete",
                stats.failed,
                stats.candidates()
            );
            warn!("{}", message);
            Some(message)
        } else {
            None
        };

        // Stable: equal scores keep input order
        results.sort_by(|a, b| b.similarity().total_cmp(&a.similarity()));

        if let Some(max_results) = self.config.max_results {
            results.truncate(max_results);
        }

        stats.matched = results.len();
        info!(
            "Semantic search matched {} of {} records",
            stats.matched, stats.total
        );

        Ok(RankOutcome {
            results,
            stats,
            warning,
        })
    }

    async fn score_text(&self, query_vector: &[f32], text: &str) -> Result<f32> {
        let vector = self.provider.embed(text).await?;

        if vector.len() != query_vector.len() {
            return Err(SemanticError::DimensionMismatch {
                expected: query_vector.len(),
                actual: vector.len(),
            });
        }

        Ok(cosine_similarity(query_vector, &vector))
    }
}
