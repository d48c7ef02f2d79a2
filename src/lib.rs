//! # Griddle - Tabular Data Exploration Core
//!
//! Griddle is the engine behind a single-page data exploration tool: upload
//! a tabular dataset, inspect its shape and column types, apply cleaning
//! steps, describe a chart, download the result. The crate owns the data
//! work; widgets, layout, and pixel-level rendering belong to the host.
//!
//! ## Quick Start
//!
//! ```no_run
//! use griddle::{CleaningStep, Session};
//!
//! # fn example() -> griddle::Result<()> {
//! let mut session = Session::new();
//! session.load(b"city,temp\noslo,3\noslo,3\n", "weather.csv")?;
//!
//! let report = session.apply(&CleaningStep::RemoveDuplicates)?;
//! println!("{}", report.message);
//!
//! for column in session.describe()? {
//!     println!("{}: {} ({} missing)", column.name, column.kind, column.missing);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`loader`]: uploaded bytes to a table (CSV via polars, xls/xlsx via
//!   calamine)
//! - [`inspect`]: read-only per-column metadata and previews
//! - [`cleaning`]: user-triggered table transformations, each atomic
//! - [`chart`]: renderer-agnostic chart descriptions
//! - [`export`]: the table back out as CSV or xlsx bytes
//! - [`session`]: the explicit per-user state object hosts thread through
//!   every interaction
//! - [`error`]: the recoverable error taxonomy
//!
//! ## Execution Model
//!
//! Everything is synchronous and single-owner: each call runs to completion
//! on the caller's thread against a session no one else holds. A failed
//! operation reports an error and leaves the working table exactly as it
//! was; every error is recoverable by trying again with different input.

#![warn(clippy::all, rust_2018_idioms)]

pub mod chart;
pub mod cleaning;
pub mod error;
pub mod export;
pub mod inspect;
pub mod loader;
pub mod logging;
pub mod session;

pub use chart::{ChartData, ChartKind, ChartRequest, ChartSpec, FiveNumberSummary};
pub use cleaning::{CleaningStep, StepReport};
pub use error::{Error, Result};
pub use export::{ExportFormat, ExportPayload, ExportRequest};
pub use inspect::{ColumnDescriptor, ColumnKind, DatasetSummary};
pub use session::Session;
