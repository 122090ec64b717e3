use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors that stop a catalog ingestion run.
pub enum IndexerError {
    #[error("failed to read catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog store rejected the collection: {0}")]
    Store(#[from] StoreError),
}
