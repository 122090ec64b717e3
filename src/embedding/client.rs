use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Embedder;
use super::error::EmbeddingError;

/// Body of `POST /embed`.
#[derive(Debug, Serialize)]
pub struct EmbedRequest<'a> {
    pub text: &'a str,
}

/// Successful (or error) body returned by `POST /embed`.
#[derive(Debug, Default, Deserialize)]
pub struct EmbedResponse {
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

impl EmbedResponse {
    /// Extracts the vector, rejecting empty or inconsistent payloads.
    pub fn into_embedding(self) -> Result<Vec<f32>, EmbeddingError> {
        let embedding = match self.embedding {
            Some(v) if !v.is_empty() => v,
            _ => return Err(EmbeddingError::MissingEmbedding),
        };

        if let Some(dimension) = self.dimension
            && dimension != embedding.len()
        {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!(
                    "declared dimension {} but received {} values",
                    dimension,
                    embedding.len()
                ),
            });
        }

        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::InvalidResponse {
                reason: "embedding contains non-finite values".to_string(),
            });
        }

        Ok(embedding)
    }
}

#[derive(Clone)]
/// HTTP client for the external embedding service.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpEmbedder {
    /// Creates a client for `{base_url}/embed` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::ClientBuildFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/embed", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// Returns the full `/embed` URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        after: self.timeout,
                    }
                } else {
                    EmbeddingError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: EmbedResponse = response.json().await.unwrap_or_default();
            return Err(EmbeddingError::ServiceStatus {
                status: status.as_u16(),
                message: body
                    .error
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }

        let body: EmbedResponse = response.json().await?;
        let embedding = body.into_embedding()?;

        debug!(dimension = embedding.len(), "Received query embedding");
        Ok(embedding)
    }
}

impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request_embedding(text).await
    }
}
