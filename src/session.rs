//! Explicit session-scoped state.
//!
//! The hosting UI runtime owns one [`Session`] per user and threads it
//! through every interaction; there is no hidden global "current table".
//! The session holds the working table, the identity of the upload it came
//! from, and the single-entry load cache that spares repeated re-renders
//! from re-decoding the same bytes.
//!
//! One owner, synchronous calls, no locking: a session is never touched by
//! two operations at once.

use polars::prelude::DataFrame;
use sha2::{Digest as _, Sha256};

use crate::chart::{self, ChartRequest, ChartSpec};
use crate::cleaning::{self, CleaningStep, StepReport};
use crate::error::{Error, Result};
use crate::export::{self, ExportPayload, ExportRequest};
use crate::inspect::{self, ColumnDescriptor, DatasetSummary};
use crate::loader;

struct CachedLoad {
    filename: String,
    digest: [u8; 32],
    table: DataFrame,
}

/// The state of one user's exploration: at most one working table at a
/// time, replaced wholesale on upload and after each successful cleaning
/// step.
#[derive(Default)]
pub struct Session {
    table: Option<DataFrame>,
    cache: Option<CachedLoad>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an upload and make it the working table, discarding any
    /// previous table and cleaning. Re-uploading identical bytes under the
    /// same name reuses the cached decode.
    pub fn load(&mut self, bytes: &[u8], filename: &str) -> Result<&DataFrame> {
        let digest: [u8; 32] = Sha256::digest(bytes).into();

        let table = match &self.cache {
            Some(cached) if cached.filename == filename && cached.digest == digest => {
                tracing::debug!(file = filename, "load cache hit");
                cached.table.clone()
            }
            _ => {
                let table = loader::load(bytes, filename)?;
                self.cache = Some(CachedLoad {
                    filename: filename.to_owned(),
                    digest,
                    table: table.clone(),
                });
                table
            }
        };

        Ok(self.table.insert(table))
    }

    /// The current working table, if an upload succeeded.
    pub fn table(&self) -> Option<&DataFrame> {
        self.table.as_ref()
    }

    /// Discard the working table and cache (session over, or fresh start).
    pub fn clear(&mut self) {
        self.table = None;
        self.cache = None;
    }

    /// Per-column metadata of the working table.
    pub fn describe(&self) -> Result<Vec<ColumnDescriptor>> {
        Ok(inspect::describe(self.require_table()?))
    }

    /// Shape plus schema of the working table.
    pub fn summarize(&self) -> Result<DatasetSummary> {
        Ok(inspect::summarize(self.require_table()?))
    }

    /// First `n` rows of the working table, rendered for display.
    pub fn preview(&self, n: usize) -> Result<Vec<Vec<String>>> {
        Ok(inspect::preview(self.require_table()?, n))
    }

    /// Apply one cleaning step. On success the working table is replaced;
    /// on failure it is untouched.
    pub fn apply(&mut self, step: &CleaningStep) -> Result<StepReport> {
        let table = self.require_table()?;
        let (next, report) = cleaning::apply(table, step)?;
        self.table = Some(next);
        Ok(report)
    }

    /// Build a chart spec from the working table.
    pub fn chart(&self, request: &ChartRequest) -> Result<ChartSpec> {
        chart::build(self.require_table()?, request)
    }

    /// Export the working table.
    pub fn export(&self, request: &ExportRequest) -> Result<ExportPayload> {
        export::export(self.require_table()?, request)
    }

    fn require_table(&self) -> Result<&DataFrame> {
        self.table.as_ref().ok_or(Error::NoDataset)
    }
}
