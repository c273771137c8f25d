// src/error.rs

use arrow::{datatypes::DataType, error::ArrowError};
use std::path::PathBuf;
use thiserror::Error;

/// All errors generated by the credit risk pipeline.
///
/// Every variant aborts the current run. Numeric edge cases (zero income,
/// zero-variance columns) are never reported here; they surface as
/// non-finite values in the output instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read data source {path}: {reason}")]
    DataSource { path: PathBuf, reason: String },

    #[error("required column `{0}` is missing from the table")]
    MissingColumn(String),

    #[error("required column `{column}` has non-numeric type {data_type}")]
    NonNumericColumn { column: String, data_type: DataType },

    #[error("insufficient data for correlation: {0}")]
    InsufficientData(String),

    #[error("failed to write output {path}: {reason}")]
    Output { path: PathBuf, reason: String },

    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl PipelineError {
    pub(crate) fn data_source(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::DataSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Output {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
