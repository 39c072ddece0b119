//! Error types for the model and the comparison pipeline.

use std::path::PathBuf;

/// Validation failures raised by [`CountMatrix`](crate::CountMatrix) construction
/// and by [`GroupComparisonModel`](crate::GroupComparisonModel).
///
/// All of them are detected before any numeric work starts; retrying with the
/// same input reproduces the same error.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Count matrix is not 2×V, has ragged rows, no columns, or a malformed
    /// sparse layout.
    #[error("invalid count matrix shape: {0}")]
    InvalidShape(String),
    /// A count is negative, NaN or infinite.
    #[error("invalid count {value} at row {row}, column {col}")]
    InvalidCount { row: usize, col: usize, value: f64 },
    /// Vocabulary length does not match the number of columns.
    #[error("vocabulary has {got} tokens but the count matrix has {expected} columns")]
    VocabularyMismatch { expected: usize, got: usize },
    /// Unknown prior mode string.
    #[error("prior must be 'informative' or 'uniform', got '{0}'")]
    InvalidPrior(String),
    /// Prior strength is NaN or infinite.
    #[error("alpha must be a finite number, got {0}")]
    InvalidAlpha(f64),
    /// The prior leaves a log/reciprocal argument at zero.
    #[error("degenerate prior: {0}")]
    DegeneratePrior(String),
}

/// Crate-level error for everything around the model: file I/O, parsing and
/// export.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary serialization error: {0}")]
    Bin(#[from] bincode::Error),
    #[error("guest list {path} has no column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    #[error("no comments found for any guest in {0}")]
    NoComments(PathBuf),
    #[error("sample rate must be in (0, 1], got {0}")]
    InvalidSampleRate(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
