//! Consumer credit risk metrics.
//!
//! A run loads a table of consumer credit records, derives `TotalDebt`,
//! `CreditUtilization` and `RiskFlag` for every row, and summarizes the
//! numeric columns as a Pearson correlation matrix.

pub mod config;
pub mod error;
pub mod process;
pub mod table;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use process::{
    correlate, derive_metrics, derived_fields, run_pipeline, CorrelationMatrix, DeriveOptions,
    PipelineReport,
};
