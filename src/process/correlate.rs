// src/process/correlate.rs

use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::table::numeric_columns;

/// Square, symmetric matrix of Pearson coefficients, indexed by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    /// Row-major, `columns.len()²` entries.
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Entry `(i, j)`, or `None` when either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        (i < n && j < n).then(|| self.values[i * n + j])
    }

    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.get(i, j)
    }

    /// Coefficients of column `i` against every column, in column order.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let n = self.len();
        (i < n).then(|| &self.values[i * n..(i + 1) * n])
    }

    /// Lay the matrix out as a table: a leading `""` column of row labels,
    /// then one `Float64` column per correlated column.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let n = self.len();
        let mut fields = Vec::with_capacity(n + 1);
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(n + 1);

        fields.push(Field::new("", DataType::Utf8, false));
        arrays.push(Arc::new(StringArray::from(self.columns.clone())));

        // symmetric, so row j doubles as column j
        for (j, name) in self.columns.iter().enumerate() {
            fields.push(Field::new(name, DataType::Float64, true));
            let col = Float64Array::from(self.row(j).unwrap_or_default().to_vec());
            arrays.push(Arc::new(col));
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Into::into)
    }
}

/// Pearson correlation over the numeric columns of `table`.
///
/// Only integer and floating-point columns are considered; booleans, text
/// and everything else are skipped. Each pair uses the rows where both
/// values are present (non-null and finite), independently of other pairs.
/// An `inf` from a zero-income ratio is dropped like a null.
/// Pairs with fewer than two such rows, or with zero variance on either side,
/// come out as NaN.
#[tracing::instrument(level = "info", skip(table), fields(rows = table.num_rows()))]
pub fn correlate(table: &RecordBatch) -> Result<CorrelationMatrix> {
    let numeric = numeric_columns(table)?;
    if numeric.is_empty() {
        return Err(PipelineError::InsufficientData(
            "table has no numeric columns".into(),
        ));
    }
    if table.num_rows() < 2 {
        return Err(PipelineError::InsufficientData(format!(
            "need at least 2 rows, got {}",
            table.num_rows()
        )));
    }

    let n = numeric.len();
    debug!(columns = n, "correlating numeric columns");

    // upper triangle including the diagonal, one task per pair
    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect();
    let coefficients: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| {
            if i == j {
                self_correlation(&numeric[i].1)
            } else {
                pearson(&numeric[i].1, &numeric[j].1)
            }
        })
        .collect();

    let mut values = vec![f64::NAN; n * n];
    for (&(i, j), r) in pairs.iter().zip(coefficients) {
        values[i * n + j] = r;
        values[j * n + i] = r;
    }

    let columns: Vec<String> = numeric.into_iter().map(|(name, _)| name).collect();
    info!(columns = n, "correlation matrix computed");
    Ok(CorrelationMatrix { columns, values })
}

fn observed(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// 1.0 for a column that varies, NaN otherwise.
fn self_correlation(col: &Float64Array) -> f64 {
    let xs: Vec<f64> = col.iter().filter_map(observed).collect();
    if xs.len() < 2 {
        return f64::NAN;
    }
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let ss: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
    if ss > 0.0 && ss.is_finite() {
        1.0
    } else {
        f64::NAN
    }
}

/// Two-pass Pearson coefficient over pairwise-complete observations,
/// clamped into [-1, 1].
fn pearson(a: &Float64Array, b: &Float64Array) -> f64 {
    let obs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some((observed(x)?, observed(y)?)))
        .collect();
    if obs.len() < 2 {
        return f64::NAN;
    }

    let count = obs.len() as f64;
    let mean_x = obs.iter().map(|(x, _)| x).sum::<f64>() / count;
    let mean_y = obs.iter().map(|(_, y)| y).sum::<f64>() / count;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &obs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let divisor = (var_x * var_y).sqrt();
    if divisor > 0.0 {
        (cov / divisor).clamp(-1.0, 1.0)
    } else {
        f64::NAN
    }
}
