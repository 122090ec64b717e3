use tracing::debug;

use super::Embedder;
use super::error::EmbeddingError;
use crate::hashing::hash_to_u64;

/// Dimension of stub vectors (matches all-MiniLM-L6-v2, the model behind the real service).
pub const STUB_EMBEDDING_DIM: usize = 384;

/// Deterministic in-process embedder.
///
/// Same text, same vector; different texts land on unrelated unit vectors. Useful for local
/// runs without the embedding service and for tests.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(STUB_EMBEDDING_DIM)
    }
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Synchronous form of [`Embedder::embed`].
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        debug!(text_len = text.len(), "Generating stub embedding");

        let mut state = hash_to_u64(text.as_bytes());
        let mut embedding = Vec::with_capacity(self.dimension);

        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        embedding
    }
}

impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_sync(text))
    }

    fn is_stub(&self) -> bool {
        true
    }
}
