//! Embedder client.
//!
//! - [`HttpEmbedder`] talks to the external embedding service (`POST /embed`).
//! - [`StubEmbedder`] produces deterministic vectors in-process (local runs, tests).
//!
//! Callers only depend on the [`Embedder`] trait. Failures are reported as
//! [`EmbeddingError`]; the retriever decides what a failure means (it degrades).

pub mod client;
mod error;
pub mod mock;
pub mod stub;


pub use client::{EmbedRequest, EmbedResponse, HttpEmbedder};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{FailingEmbedder, SlowEmbedder};
pub use stub::{STUB_EMBEDDING_DIM, StubEmbedder};

/// Minimal async interface for turning text into a vector.
pub trait Embedder: Send + Sync {
    /// Embeds a single text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// Returns `true` for in-process deterministic embedders.
    fn is_stub(&self) -> bool {
        false
    }
}
