//! Playlens library crate (used by the server binary and integration tests).
//!
//! Semantic retrieval and engagement analytics over a game catalog. A request narrows the
//! catalog to a candidate set ([`retrieval`]), derives engagement features ([`features`]) and
//! runs one of three seeded models ([`analysis`]) whose report carries a chart description
//! ([`visualization`]).
//!
//! # Public API Surface
//!
//! ## Service
//! - [`Config`], [`ConfigError`] - Environment configuration
//! - [`ServiceContext`], [`LiveContext`] - Embedder + store, built once per process
//! - [`gateway`] - Axum router and handlers
//! - [`CatalogIndexer`] - JSON-lines catalog ingestion
//!
//! ## Collaborators
//! - [`Embedder`], [`HttpEmbedder`], [`StubEmbedder`] - Text to vector
//! - [`RecordStore`], [`CatalogWriter`], [`QdrantRecordStore`] - Catalog access
//!
//! ## Analysis
//! - [`Retriever`] - Candidate retrieval with name-match fallback
//! - [`DeveloperClassifier`], [`RelevanceScorer`], [`ThematicClusterer`] - The three analyzers
//! - [`ml`] - Trees, forests, boosting, k-means, scaling, splits, metrics
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod context;
pub mod embedding;
pub mod features;
pub mod gateway;
pub mod hashing;
pub mod indexer;
pub mod ml;
pub mod retrieval;
pub mod store;
pub mod visualization;

pub use analysis::{
    AllOutcomes, AnalysisError, AnalysisKind, AnalysisReport, AnalysisSuite, Analyzer,
    ClassifierConfig, ClustererConfig, DeveloperClassifier, RelevanceScorer, ScorerConfig,
    StatVariable, StatisticsReport, ThematicClusterer,
};
pub use config::{Config, ConfigError};
pub use context::{ConfiguredEmbedder, ContextError, LiveContext, ServiceContext};
#[cfg(any(test, feature = "mock"))]
pub use embedding::{FailingEmbedder, SlowEmbedder};
pub use embedding::{Embedder, EmbeddingError, HttpEmbedder, STUB_EMBEDDING_DIM, StubEmbedder};
pub use features::{DerivedFeatures, FeaturedGame};
pub use hashing::{hash_to_u64, point_id_for};
pub use indexer::{CatalogIndexer, IndexSummary, IndexerConfig, IndexerError};
pub use retrieval::{RetrievalConfig, RetrievalStrategy, Retrieved, Retriever};
#[cfg(any(test, feature = "mock"))]
pub use store::MockRecordStore;
pub use store::{
    CatalogPoint, CatalogWriter, GameRecord, QdrantRecordStore, RecordStore, StoreError,
    VectorQuery,
};
pub use visualization::{ChartPanel, Visualization};
