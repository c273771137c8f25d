// src/table/schema.rs

use arrow::{
    array::{ArrayRef, AsArray, Float64Array},
    compute::cast,
    datatypes::{DataType, Float64Type},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::error::{PipelineError, Result};

/// Whether an Arrow column type takes part in numeric computation.
///
/// Covers:
/// - Int8, Int16, Int32, Int64         → numeric
/// - UInt8, UInt16, UInt32, UInt64     → numeric
/// - Float16, Float32, Float64         → numeric
/// - Boolean                           → not numeric
/// - Utf8, dates, decimals, fallback   → not numeric
pub fn is_numeric_type(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

/// Widen a numeric column to `Float64`, keeping nulls.
pub fn to_f64(name: &str, arr: &ArrayRef) -> Result<Float64Array> {
    if !is_numeric_type(arr.data_type()) {
        return Err(PipelineError::NonNumericColumn {
            column: name.to_string(),
            data_type: arr.data_type().clone(),
        });
    }
    let widened = cast(arr, &DataType::Float64)?;
    Ok(widened.as_primitive::<Float64Type>().clone())
}

/// Look up `name` in `batch` and widen it to `Float64`.
pub fn column_as_f64(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))?;
    to_f64(name, batch.column(idx))
}

/// All numeric columns of `batch` in schema order, widened to `Float64`.
pub fn numeric_columns(batch: &RecordBatch) -> Result<Vec<(String, Arc<Float64Array>)>> {
    let schema = batch.schema();
    schema
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(fld, _)| is_numeric_type(fld.data_type()))
        .map(|(fld, arr)| Ok((fld.name().clone(), Arc::new(to_f64(fld.name(), arr)?))))
        .collect()
}
