//! Process-wide service context.
//!
//! [`ServiceContext`] owns the embedder, the record store and the analysis settings. It is
//! built once at startup ([`ServiceContext::connect`]), shared read-only behind an `Arc`, and
//! torn down with [`ServiceContext::shutdown`]. Analysis calls never mutate it.

mod error;


pub use error::ContextError;

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::analysis::{
    self, AllOutcomes, AnalysisError, AnalysisKind, AnalysisReport, AnalysisSuite, StatVariable,
    StatisticsReport,
};
use crate::config::Config;
use crate::constants::STATISTICS_RECORD_CAP;
use crate::embedding::{Embedder, EmbeddingError, HttpEmbedder, STUB_EMBEDDING_DIM, StubEmbedder};
use crate::indexer::embedding_text;
use crate::retrieval::{RetrievalConfig, Retrieved, Retriever};
use crate::store::{
    CatalogPoint, CatalogWriter, GameRecord, QdrantRecordStore, RecordStore, StoreError,
};

/// Embedder picked from configuration: the HTTP service or the in-process stub.
#[derive(Debug, Clone)]
pub enum ConfiguredEmbedder {
    Http(HttpEmbedder),
    Stub(StubEmbedder),
}

impl ConfiguredEmbedder {
    pub fn from_config(config: &Config) -> Result<Self, EmbeddingError> {
        if config.stub_embedder {
            warn!("PLAYLENS_STUB_EMBEDDER set, running embedder in stub mode");
            return Ok(Self::Stub(StubEmbedder::default()));
        }
        Ok(Self::Http(HttpEmbedder::new(
            &config.embedder_url,
            config.embed_timeout,
        )?))
    }
}

impl Embedder for ConfiguredEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            Self::Http(embedder) => embedder.embed(text).await,
            Self::Stub(embedder) => embedder.embed(text).await,
        }
    }

    fn is_stub(&self) -> bool {
        matches!(self, Self::Stub(_))
    }
}

/// Context wired to the live services.
pub type LiveContext = ServiceContext<ConfiguredEmbedder, QdrantRecordStore>;

/// Embedder, store and analysis settings shared by every request.
pub struct ServiceContext<E, S> {
    embedder: E,
    store: S,
    retrieval: RetrievalConfig,
    suite: Arc<AnalysisSuite>,
}

impl<E, S> std::fmt::Debug for ServiceContext<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("retrieval", &self.retrieval)
            .finish_non_exhaustive()
    }
}

impl LiveContext {
    /// Builds the embedder, connects to Qdrant and checks it answers.
    #[instrument(
        skip_all,
        fields(qdrant_url = %config.qdrant_url, collection = %config.collection)
    )]
    pub async fn connect(config: &Config) -> Result<Self, ContextError> {
        config.validate()?;

        let embedder = ConfiguredEmbedder::from_config(config)?;
        let store =
            QdrantRecordStore::new(&config.qdrant_url, &config.collection, &config.vector_name)?;
        store.health_check().await?;

        let retrieval = RetrievalConfig::default()
            .with_index(config.vector_name.clone())
            .with_embed_timeout(config.embed_timeout);

        info!(stub_embedder = embedder.is_stub(), "Service context ready");
        Ok(Self::new(embedder, store).with_retrieval(retrieval))
    }
}

impl<E: Embedder, S: RecordStore> ServiceContext<E, S> {
    /// Context with default retrieval caps and analyzer settings.
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            retrieval: RetrievalConfig::default(),
            suite: Arc::new(AnalysisSuite::default()),
        }
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_suite(mut self, suite: AnalysisSuite) -> Self {
        self.suite = Arc::new(suite);
        self
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retrieval_config(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    pub fn suite(&self) -> &AnalysisSuite {
        &self.suite
    }

    pub fn retriever(&self) -> Retriever<'_, E, S> {
        Retriever::new(&self.embedder, &self.store, &self.retrieval)
    }

    pub async fn retrieve(&self, query: Option<&str>) -> Result<Retrieved, AnalysisError> {
        Ok(self.retriever().retrieve(query).await?)
    }

    /// Retrieves the candidate set for `query` and runs one analyzer on it.
    #[instrument(skip(self))]
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        query: Option<&str>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let retrieved = self.retrieve(query).await?;
        analysis::run(Arc::clone(&self.suite), kind, retrieved.records).await
    }

    /// Retrieves once and runs every analyzer on the same candidate set.
    #[instrument(skip(self))]
    pub async fn analyze_all(&self, query: Option<&str>) -> Result<AllOutcomes, AnalysisError> {
        let retrieved = self.retrieve(query).await?;
        analysis::run_all(Arc::clone(&self.suite), retrieved.records).await
    }

    /// Distribution summary of one numeric field over the catalog.
    #[instrument(skip(self))]
    pub async fn statistics(
        &self,
        variable: StatVariable,
    ) -> Result<StatisticsReport, AnalysisError> {
        let records = self.store.find(STATISTICS_RECORD_CAP).await?;
        analysis::describe(variable, &records)
    }

    /// Record with catalog id `id`.
    pub async fn record(&self, id: &str) -> Result<Option<GameRecord>, StoreError> {
        self.store.get(id).await
    }

    /// Releases the embedder and the store connection.
    pub async fn shutdown(self) {
        let stub = self.embedder.is_stub();
        drop(self.embedder);
        drop(self.store);
        info!(stub_embedder = stub, "Service context shut down");
    }
}

impl<E: Embedder, S: RecordStore + CatalogWriter> ServiceContext<E, S> {
    /// Embeds and stores one record, replacing any record with the same id.
    ///
    /// The embedding follows the indexer: `"<name> <developer>"`, and no vector when the
    /// embedder fails or times out.
    #[instrument(skip_all, fields(id = %record.id))]
    pub async fn save_record(&self, record: GameRecord) -> Result<(), StoreError> {
        let vector = match embedding_text(&record) {
            Some(text) => match self.retriever().embed(&text).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, "Embedding failed, storing without vector");
                    None
                }
            },
            None => None,
        };

        let dimension = vector
            .as_ref()
            .map_or(STUB_EMBEDDING_DIM as u64, |v| v.len() as u64);
        self.store.ensure_collection(dimension).await?;
        self.store
            .upsert(vec![CatalogPoint::new(record, vector)])
            .await
    }

    /// Removes a record. Returns whether it existed.
    pub async fn delete_record(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(id).await
    }
}
