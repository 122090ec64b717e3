//! Catalog ingestion: JSON lines in, embedded points out.
//!
//! Each record with a non-blank name and developer is embedded as `"<name> <developer>"`;
//! the rest are stored without a vector. Points are upserted in batches. A failing batch is
//! logged and counted, and the run continues.

mod error;

#[cfg(test)]
mod tests;

pub use error::IndexerError;

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};

use crate::embedding::{Embedder, STUB_EMBEDDING_DIM};
use crate::store::{CatalogPoint, CatalogWriter, GameRecord};

/// Points per upsert request.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub batch_size: usize,
    /// Collection dimension used when the first batch carries no vector at all.
    pub fallback_dimension: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            fallback_dimension: STUB_EMBEDDING_DIM as u64,
        }
    }
}

/// Counters of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Records parsed from the input.
    pub read: usize,
    /// Lines that were not a valid record.
    pub skipped_lines: usize,
    pub embedded: usize,
    /// Records stored without a vector (blank name/developer or embedder failure).
    pub without_vector: usize,
    pub embed_failures: usize,
    pub upserted: usize,
    pub failed_batches: usize,
}

/// Text embedded for a record, or `None` when name or developer is blank.
pub fn embedding_text(record: &GameRecord) -> Option<String> {
    let name = record.name.trim();
    let developer = match &record.developer {
        Value::String(s) => s.trim(),
        _ => "",
    };
    if name.is_empty() || developer.is_empty() {
        return None;
    }
    Some(format!("{} {}", name, developer))
}

/// Embeds records and writes them to the catalog.
pub struct CatalogIndexer<'a, E, W> {
    embedder: &'a E,
    writer: &'a W,
    config: IndexerConfig,
    dimension: Option<u64>,
}

impl<'a, E: Embedder, W: CatalogWriter> CatalogIndexer<'a, E, W> {
    pub fn new(embedder: &'a E, writer: &'a W) -> Self {
        Self::with_config(embedder, writer, IndexerConfig::default())
    }

    pub fn with_config(embedder: &'a E, writer: &'a W, config: IndexerConfig) -> Self {
        Self {
            embedder,
            writer,
            config,
            dimension: None,
        }
    }

    /// Ingests a JSON-lines catalog file. Blank lines are ignored, malformed ones skipped.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn index_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<IndexSummary, IndexerError> {
        let path = path.as_ref();
        let io_err = |source| IndexerError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let mut lines = BufReader::new(file).lines();

        let mut summary = IndexSummary::default();
        let mut batch = Vec::with_capacity(self.config.batch_size);
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await.map_err(io_err)? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GameRecord>(&line) {
                Ok(record) => {
                    summary.read += 1;
                    batch.push(record);
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "Skipping malformed catalog line");
                    summary.skipped_lines += 1;
                }
            }

            if batch.len() >= self.config.batch_size {
                self.flush(std::mem::take(&mut batch), &mut summary).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(batch, &mut summary).await?;
        }

        info!(
            read = summary.read,
            upserted = summary.upserted,
            failed_batches = summary.failed_batches,
            "Catalog ingestion complete"
        );
        Ok(summary)
    }

    /// Ingests records already in memory.
    pub async fn index_records(
        &mut self,
        records: Vec<GameRecord>,
    ) -> Result<IndexSummary, IndexerError> {
        let mut summary = IndexSummary {
            read: records.len(),
            ..IndexSummary::default()
        };

        let batch_size = self.config.batch_size.max(1);
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            let batch: Vec<GameRecord> = records.by_ref().take(batch_size).collect();
            self.flush(batch, &mut summary).await?;
        }
        Ok(summary)
    }

    async fn flush(
        &mut self,
        batch: Vec<GameRecord>,
        summary: &mut IndexSummary,
    ) -> Result<(), IndexerError> {
        let mut points = Vec::with_capacity(batch.len());
        for record in batch {
            let vector = match embedding_text(&record) {
                Some(text) => match self.embedder.embed(&text).await {
                    Ok(v) if !v.is_empty() => Some(v),
                    Ok(_) => {
                        summary.embed_failures += 1;
                        None
                    }
                    Err(e) => {
                        debug!(
                            id = %record.id,
                            error = %e,
                            "Embedding failed, storing without vector"
                        );
                        summary.embed_failures += 1;
                        None
                    }
                },
                None => None,
            };

            if vector.is_some() {
                summary.embedded += 1;
            } else {
                summary.without_vector += 1;
            }
            points.push(CatalogPoint::new(record, vector));
        }

        if self.dimension.is_none() {
            let dimension = points
                .iter()
                .find_map(|p| p.vector.as_ref().map(|v| v.len() as u64))
                .unwrap_or(self.config.fallback_dimension);
            self.writer.ensure_collection(dimension).await?;
            self.dimension = Some(dimension);
        }

        let count = points.len();
        match self.writer.upsert(points).await {
            Ok(()) => {
                summary.upserted += count;
                debug!(count, "Batch upserted");
            }
            Err(e) => {
                warn!(count, error = %e, "Batch upsert failed");
                summary.failed_batches += 1;
            }
        }
        Ok(())
    }
}
