#![cfg(any(test, feature = "mock"))]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Embedder;
use super::error::EmbeddingError;
use super::stub::StubEmbedder;

/// Embedder that always fails, counting how often it was asked.
#[derive(Debug, Default)]
pub struct FailingEmbedder {
    calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(EmbeddingError::ServiceStatus {
            status: 500,
            message: "embedding model unavailable".to_string(),
        })
    }
}

/// Embedder that answers correctly, but only after `delay`.
#[derive(Debug, Clone)]
pub struct SlowEmbedder {
    delay: Duration,
    inner: StubEmbedder,
}

impl SlowEmbedder {
    pub fn new(delay: Duration, inner: StubEmbedder) -> Self {
        Self { delay, inner }
    }
}

impl Embedder for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.inner.embed_sync(text))
    }
}
