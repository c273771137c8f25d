// src/process/mod.rs

pub mod correlate;
pub mod derive;

use arrow::record_batch::RecordBatch;
use std::path::PathBuf;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::table::{load_table, write_table};

pub use correlate::{correlate, CorrelationMatrix};
pub use derive::{derive_metrics, derived_fields, DeriveOptions};

/// What a full run produced; the tables are kept so callers can print them.
#[derive(Debug)]
pub struct PipelineReport {
    pub derived: RecordBatch,
    pub correlations: CorrelationMatrix,
    pub table_output: PathBuf,
    pub correlation_output: PathBuf,
}

/// Load → derive → write table → correlate → write matrix.
///
/// The derived table is persisted before correlation starts, so a degenerate
/// correlation input still leaves the augmented records on disk.
#[tracing::instrument(level = "info", skip(config), fields(input = %config.input.display()))]
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    let raw = load_table(&config.input)?;

    let derived = derive_metrics(raw, &config.derive_options())?;
    write_table(&derived, &config.table_output)?;
    info!(path = %config.table_output.display(), "derived table saved");

    let correlations = correlate(&derived)?;
    write_table(&correlations.to_record_batch()?, &config.correlation_output)?;
    info!(path = %config.correlation_output.display(), "correlation matrix saved");

    Ok(PipelineReport {
        derived,
        correlations,
        table_output: config.table_output.clone(),
        correlation_output: config.correlation_output.clone(),
    })
}
