// src/table/mod.rs

pub mod schema;
pub mod write;

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    error::ArrowError,
    record_batch::RecordBatch,
    util::pretty::pretty_format_batches,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::File,
    io::{Seek, SeekFrom},
    path::Path,
    sync::Arc,
};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

pub use schema::{column_as_f64, is_numeric_type, numeric_columns};
pub use write::write_table;

/// Rows per CSV read batch; batches are concatenated into one table afterwards.
const READ_BATCH_SIZE: usize = 8192;

pub(crate) fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false)
}

/// Load a record table from `path`.
///
/// `.parquet` files are read through the Arrow Parquet reader; anything else
/// is treated as a CSV with a header row, with column types inferred from the
/// whole file (empty cells become nulls).
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let batch = if is_parquet(path) {
        load_parquet(path)?
    } else {
        load_csv(path)?
    };
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "loaded table"
    );
    Ok(batch)
}

fn load_csv(path: &Path) -> Result<RecordBatch> {
    let mut file = File::open(path).map_err(|e| PipelineError::data_source(path, e))?;

    // 1) infer column types over every record
    let (schema, records) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)
        .map_err(|e| PipelineError::data_source(path, e))?;
    if schema.fields().is_empty() {
        return Err(PipelineError::data_source(path, "no header row"));
    }
    debug!(records, fields = schema.fields().len(), "inferred csv schema");

    // 2) rewind and parse with the inferred schema
    file.seek(SeekFrom::Start(0))
        .map_err(|e| PipelineError::data_source(path, e))?;
    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(READ_BATCH_SIZE)
        .build(file)
        .map_err(|e| PipelineError::data_source(path, e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(|e| PipelineError::data_source(path, e))?;

    concat_batches(&schema, &batches).map_err(|e| PipelineError::data_source(path, e))
}

fn load_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).map_err(|e| PipelineError::data_source(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| PipelineError::data_source(path, e))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| PipelineError::data_source(path, e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, ArrowError>>()
        .map_err(|e| PipelineError::data_source(path, e))?;

    concat_batches(&schema, &batches).map_err(|e| PipelineError::data_source(path, e))
}

/// Render the first `rows` rows of `batch` as an ASCII table.
pub fn preview(batch: &RecordBatch, rows: usize) -> Result<String> {
    let head = batch.slice(0, rows.min(batch.num_rows()));
    Ok(pretty_format_batches(&[head])?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use arrow::{
        array::{Array, AsArray},
        datatypes::{DataType, Float64Type, Int64Type},
    };
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,creditrisk=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn csv_file(content: &str) -> Result<NamedTempFile> {
        let mut tmp = Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        Ok(tmp)
    }

    #[test]
    fn test_load_bankloans_sample() -> Result<()> {
        init_test_logging();
        let tmp = csv_file(
            "age,ed,employ,address,income,debtinc,creddebt,othdebt,default\n\
             41,3,17,12,176,9.3,11.359392,5.008608,1\n\
             27,1,10,6,31,17.3,1.362202,4.000798,0\n\
             40,1,15,14,55,5.5,0.856075,2.168925,\n",
        )?;

        let batch = load_table(tmp.path())?;
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 9);

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(5).data_type(), &DataType::Float64);
        // integer-looking income is still numeric
        assert_eq!(schema.field(4).data_type(), &DataType::Int64);

        let default = batch.column(8).as_primitive::<Int64Type>();
        assert!(default.is_null(2));
        let debtinc = batch.column(5).as_primitive::<Float64Type>();
        assert_eq!(debtinc.value(1), 17.3);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        let err = load_table("definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, PipelineError::DataSource { .. }));
    }

    #[test]
    fn test_ragged_csv_is_data_source_error() -> Result<()> {
        let tmp = csv_file("a,b\n1,2\n3,4,5\n")?;
        let err = load_table(tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DataSource { .. }));
        Ok(())
    }

    #[test]
    fn test_empty_file_is_data_source_error() -> Result<()> {
        let tmp = csv_file("")?;
        let err = load_table(tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DataSource { .. }));
        Ok(())
    }

    #[test]
    fn test_preview_limits_rows() -> Result<()> {
        let tmp = csv_file("x,y\n1,2\n3,4\n5,6\n")?;
        let batch = load_table(tmp.path())?;
        let text = preview(&batch, 2)?;
        assert!(text.contains("| x | y |"));
        assert!(text.contains("| 3 | 4 |"));
        assert!(!text.contains("| 5 | 6 |"));
        // asking for more rows than exist is fine
        assert!(preview(&batch, 50)?.contains("| 5 | 6 |"));
        Ok(())
    }
}
