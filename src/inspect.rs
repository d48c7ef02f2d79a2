//! Schema inspection: read-only, per-column metadata for display.
//!
//! Everything here is a pure function of a table snapshot and is recomputed
//! on every call; nothing is persisted between calls.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The semantic type of a column, as shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Number,
    Date,
    Category,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Category => "category",
        }
    }

    /// Map a polars dtype onto the four user-facing kinds. Booleans read as
    /// two-value categories in this model.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            d if d.is_primitive_numeric() => Self::Number,
            d if d.is_temporal() => Self::Date,
            DataType::Boolean | DataType::Categorical(_, _) => Self::Category,
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived per-column metadata.
///
/// `missing_pct` is `missing / rows * 100` rounded half-up to two decimal
/// places; an empty table reports 0 for every column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
    pub missing_pct: f64,
}

/// Row/column counts plus the per-column descriptors, for the dataset
/// information panel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub schema: Vec<ColumnDescriptor>,
}

/// Describe every column of the table, in table order.
pub fn describe(df: &DataFrame) -> Vec<ColumnDescriptor> {
    let rows = df.height();
    df.get_columns()
        .iter()
        .map(|col| {
            let missing = col.null_count();
            let missing_pct = if rows == 0 {
                0.0
            } else {
                round2(missing as f64 / rows as f64 * 100.0)
            };
            ColumnDescriptor {
                name: col.name().to_string(),
                kind: ColumnKind::from_dtype(col.dtype()),
                missing,
                missing_pct,
            }
        })
        .collect()
}

/// Shape plus schema in one call.
pub fn summarize(df: &DataFrame) -> DatasetSummary {
    DatasetSummary {
        rows: df.height(),
        columns: df.width(),
        schema: describe(df),
    }
}

/// Render the first `n` rows as display strings (row-major). Nulls render
/// as empty cells.
pub fn preview(df: &DataFrame, n: usize) -> Vec<Vec<String>> {
    let head = df.head(Some(n));
    let mut rendered: Vec<Vec<String>> = Vec::with_capacity(head.width());

    for col in head.get_columns() {
        let series = col.as_materialized_series();
        let cells = match series.cast(&DataType::String) {
            Ok(s) => s
                .str()
                .map(|ca| {
                    ca.into_iter()
                        .map(|v| v.map(str::to_owned).unwrap_or_default())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|_| vec![String::new(); head.height()]),
            Err(_) => (0..head.height())
                .map(|i| series.get(i).map(|av| av.to_string()).unwrap_or_default())
                .collect(),
        };
        rendered.push(cells);
    }

    (0..head.height())
        .map(|r| rendered.iter().map(|col| col[r].clone()).collect())
        .collect()
}

/// Names of the columns whose dtype is numeric, in table order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .map(|c| c.name().to_string())
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
