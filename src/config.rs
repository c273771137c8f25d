// src/config.rs

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{PipelineError, Result};
use crate::process::derive::{DeriveOptions, DEFAULT_RISK_THRESHOLD};

pub const DEFAULT_INPUT: &str = "bankloans.csv";
pub const DEFAULT_TABLE_OUTPUT: &str = "optimized_consumer_credit_data.csv";
pub const DEFAULT_CORRELATION_OUTPUT: &str = "correlation_matrix.csv";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Settings for one pipeline run. Missing JSON keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source table (`.csv` or `.parquet`).
    pub input: PathBuf,
    /// Destination for the derived table.
    pub table_output: PathBuf,
    /// Destination for the correlation matrix.
    pub correlation_output: PathBuf,
    pub risk_threshold: f64,
    /// Rows shown in the printed preview of the derived table.
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            table_output: PathBuf::from(DEFAULT_TABLE_OUTPUT),
            correlation_output: PathBuf::from(DEFAULT_CORRELATION_OUTPUT),
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |reason: String| PipelineError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let data = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_str(&data).map_err(|e| config_error(e.to_string()))
    }

    /// Build from positional arguments (program name already stripped):
    /// `[INPUT] [CONFIG_JSON]`. A positional input wins over the config file.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let input = args.next();
        let mut config = match args.next() {
            Some(cfg) => Self::from_json_file(cfg)?,
            None => Self::default(),
        };
        if let Some(input) = input {
            config.input = PathBuf::from(input);
        }
        Ok(config)
    }

    pub fn derive_options(&self) -> DeriveOptions {
        DeriveOptions {
            risk_threshold: self.risk_threshold,
        }
    }
}
