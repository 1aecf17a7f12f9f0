use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry_if, RetryConfig};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication required")]
    AuthRequired,

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::ServerError { .. } | ApiError::RateLimitExceeded => true,
            ApiError::NetworkError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry_config: RetryConfig,
}

impl EmbeddingClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("socialpedia-search/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            client,
            base_url,
            model: model.into(),
            api_key,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    /// Embed one text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.embeddings_url();
        let payload = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        with_retry_if(&self.retry_config, ApiError::is_retryable, || async {
            let mut request = self.client.post(&url).json(&payload);

            if let Some(ref key) = self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(ApiError::AuthRequired);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ApiError::RateLimitExceeded);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();

                if is_retryable_status(status) {
                    return Err(ApiError::ServerError {
                        status: status.as_u16(),
                        body,
                    });
                }

                return Err(ApiError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            let body = response.text().await?;
            let vector = parse_embedding(&body)?;
            debug!("Remote embedding returned {} dimensions", vector.len());
            Ok(vector)
        })
        .await
    }
}

fn parse_embedding(body: &str) -> Result<Vec<f32>> {
    let parsed: EmbeddingResponse = serde_json::from_str(body)?;

    let vector = parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| ApiError::InvalidResponse("no embedding in response".into()))?;

    if vector.is_empty() {
        return Err(ApiError::InvalidResponse("empty embedding vector".into()));
    }

    Ok(vector)
}
