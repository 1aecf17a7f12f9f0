use crate::error::{Result, SemanticError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use socialpedia_api::EmbeddingClient;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Maps text to a fixed-dimension vector.
///
/// Implementations must return vectors of the same dimension for every call
/// and must be safe to call concurrently. The ranking engine never passes
/// an empty string.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text).await
    }
}

/// Local embedding model using fastembed
pub struct FastEmbedProvider {
    /// The underlying embedding model, loaded on first use
    model: Arc<RwLock<Option<TextEmbedding>>>,

    /// Model name
    model_name: String,

    /// Vector dimension
    dimension: usize,
}

impl FastEmbedProvider {
    /// Create a new provider (lazy initialization)
    pub fn new(model_name: String) -> Self {
        let dimension = match model_name.as_str() {
            "sentence-transformers/all-MiniLM-L6-v2" => 384,
            "BAAI/bge-small-en-v1.5" => 384,
            "BAAI/bge-base-en-v1.5" => 768,
            _ => 384, // default
        };

        Self {
            model: Arc::new(RwLock::new(None)),
            model_name,
            dimension,
        }
    }

    /// Load the model (downloads if needed)
    pub async fn initialize(&self) -> Result<()> {
        let mut model_guard = self.model.write().await;

        if model_guard.is_some() {
            debug!("Embedding model already initialized");
            return Ok(());
        }

        info!("Initializing embedding model: {}", self.model_name);

        let model_type = match self.model_name.as_str() {
            "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
            "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
            _ => {
                warn!(
                    "Unknown model {}, defaulting to all-MiniLM-L6-v2",
                    self.model_name
                );
                EmbeddingModel::AllMiniLML6V2
            }
        };

        let init_options = InitOptions::new(model_type).with_show_download_progress(false);

        let embedding_model = TextEmbedding::try_new(init_options)
            .map_err(|e| SemanticError::ModelLoadError(e.to_string()))?;

        *model_guard = Some(embedding_model);

        info!("Embedding model initialized successfully");
        Ok(())
    }

    /// Release the model; the next embed call loads it again
    pub async fn shutdown(&self) {
        let mut model_guard = self.model.write().await;
        if model_guard.take().is_some() {
            info!("Embedding model {} released", self.model_name);
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.model.read().await.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Get the vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.model.read().await.is_none() {
            self.initialize().await?;
        }

        let model_guard = self.model.read().await;
        let model = model_guard
            .as_ref()
            .ok_or(SemanticError::ModelNotInitialized)?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| SemanticError::ProviderFailure(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SemanticError::ProviderFailure("No embeddings generated".to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(EmbeddingClient::embed(self, text).await?)
    }
}
