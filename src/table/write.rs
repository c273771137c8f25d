// src/table/write.rs

use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{
    arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};
use tracing::debug;

use super::is_parquet;
use crate::error::{PipelineError, Result};

/// Persist `batch` to `path`.
///
/// - `.parquet` → Parquet (SNAPPY)
/// - otherwise  → CSV with a header row, no index column
///
/// The file is written to a hidden temp sibling and renamed over `path`, so a
/// failed run never leaves a half-written artifact behind.
#[tracing::instrument(
    level = "info",
    skip(batch, path),
    fields(path = %path.as_ref().display(), rows = batch.num_rows())
)]
pub fn write_table<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::output(path, e))?;
    }

    let file_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| PipelineError::output(path, "destination has no file name"))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));
    let file = File::create(&tmp_path).map_err(|e| PipelineError::output(&tmp_path, e))?;

    let written = if is_parquet(path) {
        write_parquet(batch, file, path)
    } else {
        write_csv(batch, file, path)
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| PipelineError::output(path, e))?;
    debug!(columns = batch.num_columns(), "table written");
    Ok(())
}

fn write_csv(batch: &RecordBatch, file: File, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer
        .write(batch)
        .map_err(|e| PipelineError::output(path, e))?;
    writer
        .into_inner()
        .flush()
        .map_err(|e| PipelineError::output(path, e))
}

fn write_parquet(batch: &RecordBatch, file: File, path: &Path) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| PipelineError::output(path, e))?;
    writer
        .write(batch)
        .map_err(|e| PipelineError::output(path, e))?;
    writer
        .close()
        .map_err(|e| PipelineError::output(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::load_table;
    use anyhow::Result;
    use arrow::{
        array::{ArrayRef, BooleanArray, Float64Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("creddebt", DataType::Float64, true),
            Field::new("region", DataType::Utf8, true),
            Field::new("RiskFlag", DataType::Boolean, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Float64Array::from(vec![500.5, 100.25, 7.0])) as ArrayRef,
                Arc::new(StringArray::from(vec!["north", "south", "east"])),
                Arc::new(BooleanArray::from(vec![true, false, true])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_layout() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/out.csv");
        write_table(&sample(), &path)?;

        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "creddebt,region,RiskFlag");
        assert_eq!(lines[1], "500.5,north,true");
        assert_eq!(lines.len(), 4);

        // no temp file left behind
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn test_csv_round_trip_keeps_order() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let batch = sample();
        write_table(&batch, &path)?;

        let back = load_table(&path)?;
        assert_eq!(back.num_rows(), 3);
        assert_eq!(back.schema().field(0).name(), "creddebt");
        assert_eq!(back.schema().field(2).data_type(), &DataType::Boolean);
        assert_eq!(back.column(1).as_ref(), batch.column(1).as_ref());
        assert_eq!(back.column(0).as_ref(), batch.column(0).as_ref());
        Ok(())
    }

    #[test]
    fn test_parquet_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.parquet");
        let batch = sample();
        write_table(&batch, &path)?;

        let back = load_table(&path)?;
        assert_eq!(back.num_rows(), batch.num_rows());
        for (i, field) in batch.schema().fields().iter().enumerate() {
            assert_eq!(back.schema().field(i).name(), field.name());
            assert_eq!(back.column(i).as_ref(), batch.column(i).as_ref());
        }
        Ok(())
    }
}
