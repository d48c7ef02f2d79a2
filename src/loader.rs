//! Dataset loading: uploaded bytes in, `DataFrame` out.
//!
//! Dispatches on the upload's filename extension: `.csv` goes through the
//! polars CSV reader with schema inference, `.xls`/`.xlsx` through calamine
//! with per-column type inference. Anything else is rejected before any
//! decoding happens.
//!
//! Loading is a pure function of the input bytes, so callers may cache the
//! result keyed by file identity ([`crate::session::Session`] does exactly
//! that).

use std::io::Cursor;

use anyhow::{Context as _, Result as AnyResult, bail};
use calamine::{Data, Reader as _, open_workbook_auto_from_rs};
use polars::prelude::*;

use crate::error::{Error, Result};

/// Decode an uploaded file into a table.
///
/// # Errors
///
/// [`Error::UnsupportedFormat`] for extensions outside {csv, xls, xlsx};
/// [`Error::Load`] for any decode failure.
pub fn load(bytes: &[u8], filename: &str) -> Result<DataFrame> {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match ext.as_str() {
        "csv" => read_csv(bytes).map_err(|e| Error::Load(format!("{e:#}")))?,
        "xls" | "xlsx" => read_workbook(bytes).map_err(|e| Error::Load(format!("{e:#}")))?,
        other => return Err(Error::UnsupportedFormat(other.to_owned())),
    };

    tracing::info!(
        file = filename,
        rows = df.height(),
        columns = df.width(),
        "loaded dataset"
    );
    Ok(df)
}

fn read_csv(bytes: &[u8]) -> AnyResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .context("Failed to read CSV")
}

fn read_workbook(bytes: &[u8]) -> AnyResult<DataFrame> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open workbook")?;

    let sheet_names = workbook.sheet_names().to_vec();
    let Some(sheet_name) = sheet_names.first() else {
        bail!("Workbook has no sheets");
    };
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Failed to read sheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_header).collect())
        .unwrap_or_default();

    // Column-major typed cells; the header row is not data.
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(idx).map(CellValue::from_cell).unwrap_or(CellValue::Null));
        }
    }

    let columns = headers
        .iter()
        .zip(&cells)
        .map(|(name, values)| build_column(name, values))
        .collect::<Vec<_>>();

    let df = DataFrame::new(columns).context("Failed to assemble table")?;
    coerce_temporal_text(df)
}

fn cell_header(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => cell_to_string(other),
    }
}

/// A single spreadsheet cell after decoding, before column typing.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    fn from_cell(cell: &Data) -> Self {
        match cell {
            Data::Empty => Self::Null,
            Data::Bool(b) => Self::Bool(*b),
            Data::Int(i) => Self::Int(*i),
            Data::Float(f) => Self::Float(*f),
            Data::String(s) => Self::from_text(s),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => Self::Text(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
                None => Self::Null,
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(_) => Self::Null,
        }
    }

    /// Interpret a text cell: spreadsheets routinely hold numbers and
    /// missing-value markers as strings.
    fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            return Self::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Self::Float(f);
        }
        if let Some(iso) = parse_date_text(trimmed) {
            return Self::Text(iso);
        }
        Self::Text(trimmed.to_owned())
    }
}

/// Normalize common date spellings to ISO so the temporal coercion pass can
/// pick the column up.
fn parse_date_text(s: &str) -> Option<String> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y"];
    for fmt in FORMATS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, fmt) {
            return Some(date.format("%Y-%m-%dT00:00:00").to_string());
        }
    }
    None
}

fn is_missing_token(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    matches!(
        s.to_lowercase().as_str(),
        "n/a" | "na" | "null" | "none" | "nan"
    )
}

/// The dtype a whole column settles on, given every cell in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnShape {
    Empty,
    Bool,
    Int,
    Float,
    Text,
}

fn resolve_shape(values: &[CellValue]) -> ColumnShape {
    let mut shape = ColumnShape::Empty;
    for value in values {
        let observed = match value {
            CellValue::Null => continue,
            CellValue::Bool(_) => ColumnShape::Bool,
            CellValue::Int(_) => ColumnShape::Int,
            CellValue::Float(_) => ColumnShape::Float,
            CellValue::Text(_) => ColumnShape::Text,
        };
        shape = match (shape, observed) {
            (ColumnShape::Empty, s) => s,
            (a, b) if a == b => a,
            // An int/float mix promotes to float; every other mix is text.
            (ColumnShape::Int, ColumnShape::Float) | (ColumnShape::Float, ColumnShape::Int) => {
                ColumnShape::Float
            }
            _ => ColumnShape::Text,
        };
    }
    shape
}

fn build_column(name: &str, values: &[CellValue]) -> Column {
    let series = match resolve_shape(values) {
        ColumnShape::Bool => Series::new(
            name.into(),
            values
                .iter()
                .map(|v| match v {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnShape::Int => Series::new(
            name.into(),
            values
                .iter()
                .map(|v| match v {
                    CellValue::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnShape::Float => Series::new(
            name.into(),
            values
                .iter()
                .map(|v| match v {
                    CellValue::Int(i) => Some(*i as f64),
                    CellValue::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnShape::Empty | ColumnShape::Text => Series::new(
            name.into(),
            values
                .iter()
                .map(|v| match v {
                    CellValue::Null => None,
                    CellValue::Bool(b) => Some(b.to_string()),
                    CellValue::Int(i) => Some(i.to_string()),
                    CellValue::Float(f) => Some(f.to_string()),
                    CellValue::Text(s) => Some(s.clone()),
                })
                .collect::<Vec<_>>(),
        ),
    };
    Column::from(series)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{f:.0}")
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => String::new(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

/// Cast text columns that are mostly date-like to a datetime dtype.
///
/// A column converts only when fewer than half its values fail the parse,
/// so genuinely textual columns are left alone.
fn coerce_temporal_text(df: DataFrame) -> AnyResult<DataFrame> {
    let mut df = df;
    let schema = df.schema().clone();

    for (name, dtype) in schema.iter() {
        if dtype.is_primitive_numeric() || dtype.is_temporal() || dtype.is_bool() {
            continue;
        }
        if let Ok(col) = df.column(name) {
            let s = col.as_materialized_series().clone();
            if s.null_count() == s.len() {
                continue;
            }
            if let Ok(casted) = s.cast(&DataType::Datetime(TimeUnit::Milliseconds, None)) {
                if casted.null_count() < s.len() / 2 {
                    let _ = df.replace(name, casted);
                }
            }
        }
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_loads_with_inferred_types() {
        let df = load(b"name,age\nalice,34\nbob,\n", "people.csv").unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
        assert!(df.column("age").unwrap().dtype().is_primitive_numeric());
        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unknown_extension_rejected_before_decoding() {
        let err = load(b"whatever", "report.pdf").unwrap_err();
        assert_eq!(err, Error::UnsupportedFormat("pdf".to_owned()));
    }

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        let df = load(b"a\n1\n", "DATA.CSV").unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_malformed_workbook_is_a_load_error_not_a_panic() {
        let err = load(b"definitely not a zip archive", "data.xlsx").unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_text_cell_inference() {
        assert_eq!(CellValue::from_text("42"), CellValue::Int(42));
        assert_eq!(CellValue::from_text("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::from_text("  N/A "), CellValue::Null);
        assert_eq!(CellValue::from_text("oslo"), CellValue::Text("oslo".to_owned()));
    }

    #[test]
    fn test_int_float_mix_promotes_to_float() {
        let values = vec![CellValue::Int(1), CellValue::Float(2.5), CellValue::Null];
        assert_eq!(resolve_shape(&values), ColumnShape::Float);

        let col = build_column("x", &values);
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_mixed_text_and_number_demotes_to_text() {
        let values = vec![CellValue::Int(1), CellValue::Text("two".to_owned())];
        assert_eq!(resolve_shape(&values), ColumnShape::Text);
    }
}
