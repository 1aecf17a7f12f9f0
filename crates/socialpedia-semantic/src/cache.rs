use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;
use socialpedia_cache::EmbeddingCache;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Embedding provider backed by a persistent cache.
///
/// Lookups are keyed by `(model, text)`. The cache is best-effort: any
/// cache error is logged and the inner provider answers instead.
pub struct CachedProvider<P> {
    inner: P,
    cache: Mutex<EmbeddingCache>,
    model: String,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: EmbeddingCache, model: impl Into<String>) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
            model: model.into(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.lock().ok()?;
        match cache.get(&self.model, text) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Embedding cache read failed: {}", e);
                None
            }
        }
    }

    fn store(&self, text: &str, vector: &[f32]) {
        let Ok(cache) = self.cache.lock() else {
            warn!("Embedding cache lock poisoned, skipping write");
            return;
        };
        if let Err(e) = cache.put(&self.model, text, vector) {
            warn!("Embedding cache write failed: {}", e);
        }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.lookup(text) {
            debug!("Embedding cache hit");
            return Ok(vector);
        }

        let vector = self.inner.embed(text).await?;
        self.store(text, &vector);
        Ok(vector)
    }
}
