use thiserror::Error;

use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors raised while building the service context.
pub enum ContextError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("embedder setup failed: {0}")]
    Embedder(#[from] EmbeddingError),

    #[error("record store unavailable: {0}")]
    Store(#[from] StoreError),
}
