// src/process/derive.rs

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array},
    compute::binary,
    datatypes::{DataType, Field, Float64Type, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::table::column_as_f64;

pub const CREDDEBT: &str = "creddebt";
pub const OTHDEBT: &str = "othdebt";
pub const INCOME: &str = "income";
pub const DEBTINC: &str = "debtinc";

/// Input columns, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 4] = [CREDDEBT, OTHDEBT, INCOME, DEBTINC];

pub const TOTAL_DEBT: &str = "TotalDebt";
pub const CREDIT_UTILIZATION: &str = "CreditUtilization";
pub const RISK_FLAG: &str = "RiskFlag";

/// Debt-to-income percentage above which a record is flagged.
pub const DEFAULT_RISK_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeriveOptions {
    /// `RiskFlag` is set when `debtinc` is strictly greater than this.
    pub risk_threshold: f64,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
        }
    }
}

/// The columns `derive_metrics` adds to its input, in append order.
///
/// `TotalDebt` and `CreditUtilization` are `Float64`, so they show up in the
/// correlation matrix; `RiskFlag` is `Boolean` and does not.
pub fn derived_fields() -> Vec<Field> {
    vec![
        Field::new(TOTAL_DEBT, DataType::Float64, true),
        Field::new(CREDIT_UTILIZATION, DataType::Float64, true),
        Field::new(RISK_FLAG, DataType::Boolean, true),
    ]
}

/// Augment a table of consumer credit records with `TotalDebt`,
/// `CreditUtilization` and `RiskFlag`.
///
/// Row count and order are untouched, as are all existing columns. A derived
/// column that already exists in the input is overwritten where it stands.
///
/// `CreditUtilization` follows IEEE division: a zero `income` yields `inf`
/// (or `NaN` for `0 / 0`) rather than an error. Null operands give null
/// metrics, and a null `debtinc` is never flagged.
#[tracing::instrument(level = "info", skip(table, opts), fields(rows = table.num_rows()))]
pub fn derive_metrics(table: RecordBatch, opts: &DeriveOptions) -> Result<RecordBatch> {
    // every required column has to be present before any work starts
    let schema = table.schema();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|name| schema.index_of(name).is_err())
    {
        return Err(PipelineError::MissingColumn(missing.to_string()));
    }

    let creddebt = column_as_f64(&table, CREDDEBT)?;
    let othdebt = column_as_f64(&table, OTHDEBT)?;
    let income = column_as_f64(&table, INCOME)?;
    let debtinc = column_as_f64(&table, DEBTINC)?;

    let total_debt = binary::<_, _, _, Float64Type>(&creddebt, &othdebt, |c, o| c + o)?;
    let utilization = binary::<_, _, _, Float64Type>(&creddebt, &income, |c, i| c / i)?;
    let risk_flag = risk_flags(&debtinc, opts.risk_threshold);

    let non_finite = utilization
        .iter()
        .filter(|v| v.is_some_and(|u| !u.is_finite()))
        .count();
    if non_finite > 0 {
        warn!(
            rows = non_finite,
            "credit utilization is non-finite (zero income)"
        );
    }

    let derived: [ArrayRef; 3] = [
        Arc::new(total_debt),
        Arc::new(utilization),
        Arc::new(risk_flag),
    ];

    let mut fields: Vec<Arc<Field>> = schema.fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = table.columns().to_vec();
    for (field, array) in derived_fields().into_iter().zip(derived) {
        match schema.index_of(field.name()) {
            Ok(idx) => {
                debug!(column = field.name(), "replacing existing column");
                fields[idx] = Arc::new(field);
                columns[idx] = array;
            }
            Err(_) => {
                fields.push(Arc::new(field));
                columns.push(array);
            }
        }
    }

    let out_schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    RecordBatch::try_new(out_schema, columns).map_err(Into::into)
}

fn risk_flags(debtinc: &Float64Array, threshold: f64) -> BooleanArray {
    debtinc
        .iter()
        .map(|v| Some(v.is_some_and(|d| d > threshold)))
        .collect()
}
