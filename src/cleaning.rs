//! User-triggered cleaning steps.
//!
//! Each step is an independent operation from one table state to the next:
//! it either fully succeeds, returning the new table plus a human-readable
//! [`StepReport`], or fully fails with the input table untouched. Steps run
//! only when the caller invokes them, in the caller's order; nothing here
//! fires automatically.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::inspect::{ColumnKind, numeric_columns};

/// One discrete table transformation, stateless beyond its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CleaningStep {
    /// Drop rows that duplicate an earlier row on every column.
    RemoveDuplicates,
    /// Drop rows containing a missing value in any column.
    DropMissing,
    /// Fill missing values in each numeric column with that column's mean
    /// over its current non-missing values.
    FillMissingWithMean,
    /// Fill every missing value in every column with the given value.
    FillMissingWithConstant(String),
    /// Coerce a column to a target kind; atomic on failure.
    ConvertColumnType { column: String, target: ColumnKind },
    /// Keep exactly the named columns, in the given order.
    SelectColumns(Vec<String>),
}

/// What a successful step did, for display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepReport {
    /// Rows removed, cells filled, values converted, or columns kept,
    /// depending on the step.
    pub affected: usize,
    pub message: String,
}

/// Apply one step to the table, returning the next table state.
pub fn apply(df: &DataFrame, step: &CleaningStep) -> Result<(DataFrame, StepReport)> {
    let result = match step {
        CleaningStep::RemoveDuplicates => remove_duplicates(df),
        CleaningStep::DropMissing => drop_missing(df),
        CleaningStep::FillMissingWithMean => fill_missing_with_mean(df),
        CleaningStep::FillMissingWithConstant(value) => fill_missing_with_constant(df, value),
        CleaningStep::ConvertColumnType { column, target } => convert_column(df, column, *target),
        CleaningStep::SelectColumns(names) => select_columns(df, names),
    };
    if let Ok((next, report)) = &result {
        tracing::debug!(
            rows = next.height(),
            affected = report.affected,
            "{}",
            report.message
        );
    }
    result
}

fn remove_duplicates(df: &DataFrame) -> Result<(DataFrame, StepReport)> {
    let deduped = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()
        .map_err(|e| Error::Cleaning(e.to_string()))?;

    let removed = df.height() - deduped.height();
    let report = StepReport {
        affected: removed,
        message: format!("Removed {removed} duplicate rows"),
    };
    Ok((deduped, report))
}

fn drop_missing(df: &DataFrame) -> Result<(DataFrame, StepReport)> {
    let kept = df
        .clone()
        .lazy()
        .drop_nulls(None)
        .collect()
        .map_err(|e| Error::Cleaning(e.to_string()))?;

    let removed = df.height() - kept.height();
    let report = StepReport {
        affected: removed,
        message: format!("Dropped {removed} rows with missing values"),
    };
    Ok((kept, report))
}

fn fill_missing_with_mean(df: &DataFrame) -> Result<(DataFrame, StepReport)> {
    let numeric = numeric_columns(df);
    if numeric.is_empty() {
        return Err(Error::Cleaning("no numeric columns to fill".to_owned()));
    }

    let filled_cells: usize = numeric
        .iter()
        .filter_map(|name| df.column(name).ok())
        .map(Column::null_count)
        .sum();

    // The mean is computed over non-missing values at the time of the call,
    // so a second application finds nothing left to fill.
    let exprs: Vec<Expr> = df
        .get_column_names()
        .iter()
        .map(|name| {
            let name = name.as_str();
            if numeric.iter().any(|n| n == name) {
                let e = col(name);
                e.clone().fill_null(e.mean())
            } else {
                col(name)
            }
        })
        .collect();

    let filled = df
        .clone()
        .lazy()
        .select(exprs)
        .collect()
        .map_err(|e| Error::Cleaning(e.to_string()))?;

    let report = StepReport {
        affected: filled_cells,
        message: format!("Filled {filled_cells} missing values in numeric columns with their means"),
    };
    Ok((filled, report))
}

fn fill_missing_with_constant(df: &DataFrame, value: &str) -> Result<(DataFrame, StepReport)> {
    let filled_cells: usize = df.get_columns().iter().map(Column::null_count).sum();

    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|column| {
            let name = column.name().as_str();
            if column.null_count() == 0 {
                return col(name);
            }
            // A numeric column keeps its dtype when the value parses as a
            // number; otherwise the column is rendered to text and filled
            // verbatim.
            if column.dtype().is_primitive_numeric() {
                if let Ok(i) = value.trim().parse::<i64>() {
                    return col(name).fill_null(lit(i));
                }
                if let Ok(f) = value.trim().parse::<f64>() {
                    return col(name).fill_null(lit(f));
                }
            }
            col(name).cast(DataType::String).fill_null(lit(value.to_owned()))
        })
        .collect();

    let filled = df
        .clone()
        .lazy()
        .select(exprs)
        .collect()
        .map_err(|e| Error::Cleaning(e.to_string()))?;

    let report = StepReport {
        affected: filled_cells,
        message: format!("Filled {filled_cells} missing values with '{value}'"),
    };
    Ok((filled, report))
}

fn convert_column(df: &DataFrame, column: &str, target: ColumnKind) -> Result<(DataFrame, StepReport)> {
    let Ok(existing) = df.column(column) else {
        return Err(Error::Cleaning(format!("column '{column}' not found")));
    };
    let series = existing.as_materialized_series().clone();

    let casted = cast_to_kind(&series, target).map_err(|e| Error::Conversion {
        column: column.to_owned(),
        detail: e.to_string(),
    })?;

    // polars non-strict casts turn uncoercible values into nulls; any new
    // null means the conversion must fail with the table unchanged.
    let failures = casted.null_count() - series.null_count();
    if failures > 0 {
        return Err(Error::Conversion {
            column: column.to_owned(),
            detail: format!("{failures} value(s) could not be coerced to {target}"),
        });
    }

    let converted = series.len() - series.null_count();
    let mut next = df.clone();
    next.replace(column, casted)
        .map_err(|e| Error::Conversion {
            column: column.to_owned(),
            detail: e.to_string(),
        })?;

    let report = StepReport {
        affected: converted,
        message: format!("Converted {column} to {target}"),
    };
    Ok((next, report))
}

fn cast_to_kind(series: &Series, target: ColumnKind) -> PolarsResult<Series> {
    match target {
        ColumnKind::Text => series.cast(&DataType::String),
        ColumnKind::Number => series.cast(&DataType::Float64),
        ColumnKind::Date => series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None)),
        // Categories are labels; go through text so numeric columns can be
        // bucketed too.
        ColumnKind::Category => series
            .cast(&DataType::String)?
            .cast(&DataType::Categorical(None, Default::default())),
    }
}

fn select_columns(df: &DataFrame, names: &[String]) -> Result<(DataFrame, StepReport)> {
    if names.is_empty() {
        return Err(Error::Cleaning("select at least one column to keep".to_owned()));
    }
    for name in names {
        if df.column(name).is_err() {
            return Err(Error::Cleaning(format!("column '{name}' not found")));
        }
    }

    let narrowed = df
        .select(names.iter().cloned())
        .map_err(|e| Error::Cleaning(e.to_string()))?;

    let report = StepReport {
        affected: names.len(),
        message: format!("Kept {} columns in the dataset", names.len()),
    };
    Ok((narrowed, report))
}
