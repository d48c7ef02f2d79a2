//! Exporting the working table to a downloadable byte stream.
//!
//! No filesystem side effects: the caller gets bytes, a MIME type, and a
//! filename, and decides what to do with them.

use anyhow::{Context as _, Result as AnyResult};
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// What the user asked to download: a format plus the filename base (no
/// extension).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub base: String,
}

/// The finished download.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: String,
}

/// Serialize the table to the requested format.
///
/// # Errors
///
/// [`Error::Export`] when serialization fails.
pub fn export(df: &DataFrame, request: &ExportRequest) -> Result<ExportPayload> {
    let bytes = match request.format {
        ExportFormat::Csv => write_csv(df),
        ExportFormat::Xlsx => write_xlsx(df),
    }
    .map_err(|e| Error::Export(format!("{e:#}")))?;

    let filename = format!("{}.{}", request.base, request.format.extension());
    tracing::info!(file = %filename, size = bytes.len(), "exported dataset");

    Ok(ExportPayload {
        bytes,
        mime: request.format.mime().to_owned(),
        filename,
    })
}

fn write_csv(df: &DataFrame) -> AnyResult<Vec<u8>> {
    let mut df = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)
        .context("Failed to write CSV")?;
    Ok(buf)
}

/// One sheet, header row first, values written with their types. Dates go
/// out as their display strings.
fn write_xlsx(df: &DataFrame) -> AnyResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Processed_Data").context("Failed to name sheet")?;

    for (idx, name) in df.get_column_names().iter().enumerate() {
        sheet
            .write_string(0, idx as u16, name.as_str())
            .context("Failed to write header")?;
    }

    for (idx, column) in df.get_columns().iter().enumerate() {
        let series = column.as_materialized_series();
        let col = idx as u16;
        for r in 0..series.len() {
            let row = (r + 1) as u32;
            let value = series
                .get(r)
                .with_context(|| format!("Failed to read row {r}"))?;
            write_cell(sheet, row, col, &value)?;
        }
    }

    workbook.save_to_buffer().context("Failed to finish workbook")
}

fn write_cell(
    sheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    value: &AnyValue<'_>,
) -> AnyResult<()> {
    match value {
        AnyValue::Null => {}
        AnyValue::Boolean(b) => {
            sheet.write_boolean(row, col, *b).context("Failed to write cell")?;
        }
        AnyValue::String(s) => {
            sheet.write_string(row, col, *s).context("Failed to write cell")?;
        }
        AnyValue::StringOwned(s) => {
            sheet
                .write_string(row, col, s.as_str())
                .context("Failed to write cell")?;
        }
        AnyValue::Float64(v) => {
            sheet.write_number(row, col, *v).context("Failed to write cell")?;
        }
        AnyValue::Float32(v) => {
            sheet
                .write_number(row, col, f64::from(*v))
                .context("Failed to write cell")?;
        }
        AnyValue::Int64(v) => {
            sheet
                .write_number(row, col, *v as f64)
                .context("Failed to write cell")?;
        }
        AnyValue::Int32(v) => {
            sheet
                .write_number(row, col, f64::from(*v))
                .context("Failed to write cell")?;
        }
        AnyValue::UInt64(v) => {
            sheet
                .write_number(row, col, *v as f64)
                .context("Failed to write cell")?;
        }
        AnyValue::UInt32(v) => {
            sheet
                .write_number(row, col, f64::from(*v))
                .context("Failed to write cell")?;
        }
        other => {
            sheet
                .write_string(row, col, &other.to_string())
                .context("Failed to write cell")?;
        }
    }
    Ok(())
}
