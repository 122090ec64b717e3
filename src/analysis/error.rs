use thiserror::Error;

use crate::ml::MlError;
use crate::store::StoreError;

#[derive(Debug, Error)]
/// Terminal outcomes of an analysis call.
pub enum AnalysisError {
    /// Retrieval returned nothing.
    #[error("no games found for this query")]
    NoData,

    /// Data exists but misses an algorithm's minimum size or class count.
    #[error("insufficient data: {reason}")]
    InsufficientData {
        reason: String,
        /// Qualifying developers, when the classifier got far enough to count them.
        developers_found: Option<usize>,
    },

    /// The record store failed.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// A statistics variable outside the supported set.
    #[error("unknown variable '{name}' (expected one of: {expected})")]
    UnknownVariable { name: String, expected: String },

    /// Model fitting failed on data that passed the size checks.
    #[error("model fit failed: {0}")]
    Model(#[from] MlError),

    /// The blocking worker panicked or was cancelled.
    #[error("analysis task failed: {reason}")]
    Internal { reason: String },
}

impl AnalysisError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
            developers_found: None,
        }
    }

    pub fn insufficient_developers(reason: impl Into<String>, developers_found: usize) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
            developers_found: Some(developers_found),
        }
    }

    /// Qualifying developer count carried by a classifier rejection.
    pub fn developers_found(&self) -> Option<usize> {
        match self {
            Self::InsufficientData {
                developers_found, ..
            } => *developers_found,
            _ => None,
        }
    }
}
