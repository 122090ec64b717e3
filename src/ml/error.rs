use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
/// Errors returned by model fitting.
pub enum MlError {
    /// No rows to fit on.
    #[error("cannot fit on an empty dataset")]
    EmptyInput,

    /// Rows of different widths, or targets not matching rows.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Fewer rows than the model needs.
    #[error("need at least {needed} samples, got {got}")]
    TooFewSamples {
        /// Minimum rows.
        needed: usize,
        /// Rows supplied.
        got: usize,
    },

    /// Predict called before fit.
    #[error("model is not fitted")]
    NotFitted,
}

/// Checks that `rows` is non-empty and rectangular; returns the width.
pub(crate) fn check_rows(rows: &[Vec<f64>]) -> Result<usize, MlError> {
    let width = rows.first().map(Vec::len).ok_or(MlError::EmptyInput)?;
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(MlError::DimensionMismatch {
            expected: width,
            actual: bad.len(),
        });
    }
    Ok(width)
}

pub(crate) fn check_targets(rows: usize, targets: usize) -> Result<(), MlError> {
    if rows != targets {
        return Err(MlError::DimensionMismatch {
            expected: rows,
            actual: targets,
        });
    }
    Ok(())
}
