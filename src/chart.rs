//! Chart building: a table plus axis selections in, a renderer-agnostic
//! [`ChartSpec`] out.
//!
//! The spec carries everything a plotting component needs (kind, series
//! data, labels, title) and nothing about pixels. Requests are validated
//! against the table's current column set before any computation runs.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::inspect::numeric_columns;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Histogram,
    Box,
    CorrelationMatrix,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "Bar Chart",
            Self::Line => "Line Chart",
            Self::Scatter => "Scatter Plot",
            Self::Histogram => "Histogram",
            Self::Box => "Box Plot",
            Self::CorrelationMatrix => "Correlation Matrix",
        }
    }

    /// Kinds that plot one column against another.
    fn needs_y(&self) -> bool {
        matches!(self, Self::Bar | Self::Line | Self::Scatter)
    }

    /// Every kind except the correlation matrix starts from an x column.
    fn needs_x(&self) -> bool {
        !matches!(self, Self::CorrelationMatrix)
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the user asked to plot. `x` is unused for
/// [`ChartKind::CorrelationMatrix`]; `y` only matters for kinds that need
/// two axes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Five-number summary backing a box plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// The data series of a chart, shaped per kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ChartData {
    /// One bar per group, mean of y per group, ascending group key.
    Bar { categories: Vec<String>, values: Vec<f64> },
    /// Points in table row order. When x is not numeric the points run over
    /// the row index and `x_ticks` maps positions back to the original
    /// values.
    Xy {
        points: Vec<[f64; 2]>,
        x_ticks: Option<Vec<(f64, String)>>,
    },
    /// Bins as (lower edge, count).
    Histogram { bin_width: f64, bins: Vec<(f64, usize)> },
    Box { summary: FiveNumberSummary },
    /// Symmetric Pearson matrix over the numeric columns, 1.0 diagonal.
    Correlation { columns: Vec<String>, matrix: Vec<Vec<f64>> },
}

/// A rendering-agnostic chart description.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

/// Build a chart spec from the table and the request.
///
/// # Errors
///
/// [`Error::InvalidChartRequest`] when an axis is missing, unknown, or a
/// required y is not numeric; [`Error::InsufficientNumericColumns`] for a
/// correlation matrix over fewer than two numeric columns;
/// [`Error::Chart`] for computation failures past validation.
pub fn build(df: &DataFrame, request: &ChartRequest) -> Result<ChartSpec> {
    let (x, y) = validate(df, request)?;

    let spec = match request.kind {
        ChartKind::Bar => bar_chart(df, &x, &y)?,
        ChartKind::Line => xy_chart(df, &x, &y, ChartKind::Line)?,
        ChartKind::Scatter => xy_chart(df, &x, &y, ChartKind::Scatter)?,
        ChartKind::Histogram => histogram(df, &x)?,
        ChartKind::Box => box_plot(df, &x)?,
        ChartKind::CorrelationMatrix => correlation_matrix(df)?,
    };

    tracing::debug!(kind = %request.kind, title = %spec.title, "built chart spec");
    Ok(spec)
}

/// Resolve and check the axes. Returns empty strings for axes the kind does
/// not use.
fn validate(df: &DataFrame, request: &ChartRequest) -> Result<(String, String)> {
    let x = if request.kind.needs_x() {
        let x = request
            .x
            .clone()
            .ok_or_else(|| Error::InvalidChartRequest("an x-axis column is required".to_owned()))?;
        if df.column(&x).is_err() {
            return Err(Error::InvalidChartRequest(format!("unknown x-axis column '{x}'")));
        }
        x
    } else {
        String::new()
    };

    let y = if request.kind.needs_y() {
        let y = request
            .y
            .clone()
            .ok_or_else(|| Error::InvalidChartRequest("a y-axis column is required".to_owned()))?;
        if df.column(&y).is_err() {
            return Err(Error::InvalidChartRequest(format!("unknown y-axis column '{y}'")));
        }
        if !numeric_columns(df).iter().any(|n| n == &y) {
            return Err(Error::InvalidChartRequest(format!(
                "y-axis column '{y}' must be numeric"
            )));
        }
        y
    } else {
        String::new()
    };

    Ok((x, y))
}

fn bar_chart(df: &DataFrame, x: &str, y: &str) -> Result<ChartSpec> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(x)])
        .agg([col(y).mean()])
        .sort([x], SortMultipleOptions::default())
        .collect()
        .map_err(|e| Error::Chart(e.to_string()))?;

    let categories = column_as_strings(&grouped, x)?;
    let values = column_as_f64(&grouped, y)?;

    Ok(ChartSpec {
        kind: ChartKind::Bar,
        title: format!("{y} by {x}"),
        x_label: x.to_owned(),
        y_label: y.to_owned(),
        data: ChartData::Bar { categories, values },
    })
}

fn xy_chart(df: &DataFrame, x: &str, y: &str, kind: ChartKind) -> Result<ChartSpec> {
    let ys = column_as_f64(df, y)?;

    let x_is_numeric = df
        .column(x)
        .map(|c| c.dtype().is_primitive_numeric())
        .unwrap_or(false);

    let (points, x_ticks) = if x_is_numeric {
        let xs = column_as_f64(df, x)?;
        (
            xs.iter().zip(&ys).map(|(&xv, &yv)| [xv, yv]).collect(),
            None,
        )
    } else {
        // Row order preserved; the original values become tick labels.
        let labels = column_as_strings(df, x)?;
        let points = ys
            .iter()
            .enumerate()
            .map(|(i, &yv)| [i as f64, yv])
            .collect();
        let ticks = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| (i as f64, label))
            .collect();
        (points, Some(ticks))
    };

    let title = match kind {
        ChartKind::Line => format!("{y} over {x}"),
        _ => format!("{y} vs {x}"),
    };

    Ok(ChartSpec {
        kind,
        title,
        x_label: x.to_owned(),
        y_label: y.to_owned(),
        data: ChartData::Xy { points, x_ticks },
    })
}

fn histogram(df: &DataFrame, x: &str) -> Result<ChartSpec> {
    let ca = numeric_chunked(df, x)?;

    let min = ca.min();
    let max = ca.max();
    let q1 = ca.quantile(0.25, QuantileMethod::Linear).unwrap_or(None);
    let q3 = ca.quantile(0.75, QuantileMethod::Linear).unwrap_or(None);

    let (bin_width, bins) = compute_bins(&ca, min, max, q1, q3);

    Ok(ChartSpec {
        kind: ChartKind::Histogram,
        title: format!("Distribution of {x}"),
        x_label: x.to_owned(),
        y_label: "Frequency".to_owned(),
        data: ChartData::Histogram { bin_width, bins },
    })
}

/// Freedman-Diaconis bin sizing, clamped to [5, 50] bins; a single-valued
/// column gets a 20-bin band centred on the value.
fn compute_bins(
    ca: &Float64Chunked,
    min: Option<f64>,
    max: Option<f64>,
    q1: Option<f64>,
    q3: Option<f64>,
) -> (f64, Vec<(f64, usize)>) {
    let (Some(min_v), Some(max_v)) = (min, max) else {
        return (0.0, Vec::new());
    };
    let n = ca.len() - ca.null_count();

    if (max_v - min_v).abs() < f64::EPSILON {
        let bin_width = 1.0;
        let start = min_v - 10.0 * bin_width;
        let bins = (0..20)
            .map(|i| (start + i as f64 * bin_width, if i == 10 { n } else { 0 }))
            .collect();
        return (bin_width, bins);
    }

    let iqr = q3.unwrap_or(max_v) - q1.unwrap_or(min_v);
    let h = if iqr > 0.0 {
        2.0 * iqr / (n as f64).cbrt()
    } else {
        (max_v - min_v) / (n as f64).sqrt()
    };

    let num_bins = (((max_v - min_v) / h).ceil() as usize).clamp(5, 50);
    let bin_width = (max_v - min_v) / num_bins as f64;

    let mut counts = vec![0usize; num_bins];
    for val in ca.into_iter().flatten() {
        let idx = ((val - min_v) / bin_width).floor() as usize;
        if idx < num_bins {
            counts[idx] += 1;
        } else if (val - max_v).abs() < f64::EPSILON {
            counts[num_bins - 1] += 1;
        }
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (min_v + i as f64 * bin_width, count))
        .collect();
    (bin_width, bins)
}

fn box_plot(df: &DataFrame, x: &str) -> Result<ChartSpec> {
    let ca = numeric_chunked(df, x)?;

    let summary = (|| {
        Some(FiveNumberSummary {
            min: ca.min()?,
            q1: ca.quantile(0.25, QuantileMethod::Linear).ok()??,
            median: ca.median()?,
            q3: ca.quantile(0.75, QuantileMethod::Linear).ok()??,
            max: ca.max()?,
        })
    })()
    .ok_or_else(|| Error::Chart(format!("column '{x}' has no values to plot")))?;

    Ok(ChartSpec {
        kind: ChartKind::Box,
        title: format!("Box Plot of {x}"),
        x_label: x.to_owned(),
        y_label: String::new(),
        data: ChartData::Box { summary },
    })
}

fn correlation_matrix(df: &DataFrame) -> Result<ChartSpec> {
    let columns = numeric_columns(df);
    if columns.len() < 2 {
        return Err(Error::InsufficientNumericColumns);
    }

    let series: Vec<Float64Chunked> = columns
        .iter()
        .map(|name| numeric_chunked(df, name))
        .collect::<Result<_>>()?;

    // Upper triangle mirrored onto the lower keeps the matrix symmetric by
    // construction.
    let mut matrix = vec![vec![0.0; columns.len()]; columns.len()];
    for i in 0..columns.len() {
        matrix[i][i] = 1.0;
        for j in (i + 1)..columns.len() {
            let corr = polars::prelude::cov::pearson_corr(&series[i], &series[j]).unwrap_or(0.0);
            matrix[i][j] = corr;
            matrix[j][i] = corr;
        }
    }

    Ok(ChartSpec {
        kind: ChartKind::CorrelationMatrix,
        title: "Correlation Matrix".to_owned(),
        x_label: String::new(),
        y_label: String::new(),
        data: ChartData::Correlation { columns, matrix },
    })
}

/// A column as `Float64Chunked`, or a chart error naming the column.
fn numeric_chunked(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let series = df
        .column(name)
        .map_err(|e| Error::Chart(e.to_string()))?
        .as_materialized_series();
    let casted = series
        .cast(&DataType::Float64)
        .map_err(|_| Error::Chart(format!("column '{name}' is not numeric")))?;
    casted
        .f64()
        .map(Clone::clone)
        .map_err(|e| Error::Chart(e.to_string()))
}

/// Nulls come back as NaN so row alignment survives.
fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let ca = numeric_chunked(df, name)?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn column_as_strings(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df
        .column(name)
        .map_err(|e| Error::Chart(e.to_string()))?
        .as_materialized_series();
    let casted = series
        .cast(&DataType::String)
        .map_err(|e| Error::Chart(e.to_string()))?;
    let ca = casted.str().map_err(|e| Error::Chart(e.to_string()))?;
    Ok(ca
        .into_iter()
        .map(|v| v.map(str::to_owned).unwrap_or_else(|| "null".to_owned()))
        .collect())
}
