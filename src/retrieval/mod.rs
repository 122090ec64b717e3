//! Candidate retrieval with degradation.
//!
//! No search text: the first [`RetrievalConfig::unfiltered_cap`] records in store order.
//! With search text: embed it (under a hard deadline) and run a similarity search. If the
//! embedder fails, times out, or returns nothing, fall back to a case-insensitive name match.
//! The fallback is logged, never returned as an error. Store failures are.


use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::constants::{
    DEFAULT_EMBED_TIMEOUT_SECS, FILTERED_RECORD_CAP, UNFILTERED_RECORD_CAP, VECTOR_CANDIDATE_POOL,
};
use crate::config::DEFAULT_VECTOR_NAME;
use crate::embedding::{Embedder, EmbeddingError};
use crate::store::{GameRecord, RecordStore, StoreError, VectorQuery};

/// Retrieval limits and the similarity index to query.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub unfiltered_cap: usize,
    pub filtered_cap: usize,
    pub num_candidates: usize,
    /// Named vector queried by similarity search.
    pub index: String,
    pub embed_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            unfiltered_cap: UNFILTERED_RECORD_CAP,
            filtered_cap: FILTERED_RECORD_CAP,
            num_candidates: VECTOR_CANDIDATE_POOL,
            index: DEFAULT_VECTOR_NAME.to_string(),
            embed_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
        }
    }
}

impl RetrievalConfig {
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn with_caps(mut self, unfiltered: usize, filtered: usize) -> Self {
        self.unfiltered_cap = unfiltered;
        self.filtered_cap = filtered;
        self
    }
}

/// How a candidate set was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// No search text; store order.
    Unfiltered,
    /// Similarity search; descending score.
    Semantic,
    /// Name substring match after the embedder was unavailable.
    Lexical,
}

/// Candidate set plus the strategy that produced it.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub records: Vec<GameRecord>,
    pub strategy: RetrievalStrategy,
}

impl Retrieved {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Treats empty or whitespace-only search text as absent.
pub fn normalize_query(query: Option<&str>) -> Option<&str> {
    query.filter(|q| !q.trim().is_empty())
}

/// Borrowing view over an embedder and a store.
pub struct Retriever<'a, E, S> {
    embedder: &'a E,
    store: &'a S,
    config: &'a RetrievalConfig,
}

impl<'a, E: Embedder, S: RecordStore> Retriever<'a, E, S> {
    pub fn new(embedder: &'a E, store: &'a S, config: &'a RetrievalConfig) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Fetches the candidate set for `query`.
    #[instrument(skip_all, fields(query = ?query))]
    pub async fn retrieve(&self, query: Option<&str>) -> Result<Retrieved, StoreError> {
        let Some(query) = normalize_query(query) else {
            let records = self.store.find(self.config.unfiltered_cap).await?;
            debug!(returned = records.len(), "Unfiltered retrieval");
            return Ok(Retrieved {
                records,
                strategy: RetrievalStrategy::Unfiltered,
            });
        };

        match self.embed(query).await {
            Ok(vector) => {
                let records = self
                    .store
                    .vector_search(VectorQuery {
                        vector,
                        index: self.config.index.clone(),
                        limit: self.config.filtered_cap,
                        num_candidates: self.config.num_candidates,
                    })
                    .await?;
                debug!(returned = records.len(), "Semantic retrieval");
                Ok(Retrieved {
                    records,
                    strategy: RetrievalStrategy::Semantic,
                })
            }
            Err(e) => {
                warn!(error = %e, "Embedder unavailable, falling back to name match");
                let records = self
                    .store
                    .find_by_name(query, self.config.filtered_cap)
                    .await?;
                debug!(returned = records.len(), "Lexical retrieval");
                Ok(Retrieved {
                    records,
                    strategy: RetrievalStrategy::Lexical,
                })
            }
        }
    }

    /// Embeds under the configured deadline; an empty vector counts as missing.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let deadline = self.config.embed_timeout;
        let vector = tokio::time::timeout(deadline, self.embedder.embed(text))
            .await
            .map_err(|_| EmbeddingError::Timeout { after: deadline })??;

        if vector.is_empty() {
            return Err(EmbeddingError::MissingEmbedding);
        }
        Ok(vector)
    }
}
