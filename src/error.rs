//! Centralized error handling for griddle.
//!
//! Every failure a component can produce is one variant of [`Error`], and
//! every variant is recoverable by the user: errors are caught at component
//! boundaries and reported as a message, never by panicking and never by
//! leaving a half-transformed table behind.
//!
//! ```
//! use griddle::error::Error;
//!
//! fn report(err: Error) {
//!     match err {
//!         Error::Load(msg) => eprintln!("upload failed: {msg}"),
//!         Error::InsufficientNumericColumns => eprintln!("pick a richer dataset"),
//!         other => eprintln!("{other}"),
//!     }
//! }
//! ```

use std::fmt;

/// Main error type for griddle operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The uploaded bytes could not be decoded into a table.
    Load(String),

    /// The upload's extension is outside the supported set (csv, xls, xlsx).
    UnsupportedFormat(String),

    /// A session operation was called before any dataset was loaded.
    NoDataset,

    /// A cleaning step's precondition was violated (unknown column, empty
    /// selection, mean-fill without numeric columns).
    Cleaning(String),

    /// A column type conversion failed; the table is unchanged.
    Conversion { column: String, detail: String },

    /// A chart request named a missing column or lacked a required axis.
    InvalidChartRequest(String),

    /// A correlation matrix needs at least two numeric columns.
    InsufficientNumericColumns,

    /// Chart computation failed after the request validated.
    Chart(String),

    /// The table could not be serialized to the requested format.
    Export(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(msg) => write!(f, "Error loading file: {msg}"),
            Self::UnsupportedFormat(ext) => write!(f, "Unsupported file type: .{ext}"),
            Self::NoDataset => write!(f, "No dataset loaded"),
            Self::Cleaning(msg) => write!(f, "Data cleaning error: {msg}"),
            Self::Conversion { column, detail } => {
                write!(f, "Error converting column '{column}': {detail}")
            }
            Self::InvalidChartRequest(msg) => write!(f, "Invalid chart request: {msg}"),
            Self::InsufficientNumericColumns => {
                write!(f, "Your dataset needs at least 2 numeric columns for a correlation matrix")
            }
            Self::Chart(msg) => write!(f, "Error generating visualization: {msg}"),
            Self::Export(msg) => write!(f, "Error exporting data: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for griddle operations.
pub type Result<T> = std::result::Result<T, Error>;
