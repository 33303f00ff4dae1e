//! CSV report of a campaign.
//!
//! The layout is meant for import into a spreadsheet or graphing tool:
//! section headers are indented by leading empty cells according to their
//! nesting depth, and data rows sit four cells deep under the datastore
//! header they belong to.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::aggregate::AggregateResult;
use crate::error::Result;
use crate::sweep::ThroughputRates;

/// Cells in a top-level section header row.
const MIN_HEADER_CELLS: usize = 3;
/// Leading empty cells of a data row.
const DATA_INDENT: usize = 4;

/// Append-only CSV sink. Every row is flushed as soon as it is written.
pub struct ReportWriter<W: Write> {
    inner: Writer<W>,
    headers: usize,
    data_rows: usize,
}

impl ReportWriter<File> {
    /// Creates (or truncates) the report at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wraps any writer.
    pub fn from_writer(writer: W) -> Self {
        Self {
            inner: WriterBuilder::new().flexible(true).from_writer(writer),
            headers: 0,
            data_rows: 0,
        }
    }

    /// Writes a section header, e.g. `,,PUT:` at depth 2.
    pub fn section(&mut self, depth: usize, value: impl std::fmt::Display) -> Result<()> {
        let mut cells = vec![String::new(); depth];
        cells.push(format!("{value}:"));
        if cells.len() < MIN_HEADER_CELLS {
            cells.resize(MIN_HEADER_CELLS, String::new());
        }
        self.write(&cells)?;
        self.headers += 1;
        Ok(())
    }

    /// Writes the results of one combination under `label`.
    pub fn data_row(
        &mut self,
        label: &str,
        aggregate: &AggregateResult,
        rates: &ThroughputRates,
    ) -> Result<()> {
        let mut cells = vec![String::new(); DATA_INDENT];
        cells.push(label.to_string());
        cells.push(aggregate.avg_build_micros.to_string());
        cells.push(aggregate.avg_exec_micros.to_string());
        cells.push(aggregate.avg_total_micros().to_string());
        cells.push(rate_cell(rates.transaction_rate));
        cells.push(rate_cell(rates.update_rate));
        self.write(&cells)?;
        self.data_rows += 1;
        Ok(())
    }

    /// Section header rows written so far.
    pub fn header_rows(&self) -> usize {
        self.headers
    }

    /// Data rows written so far.
    pub fn data_rows(&self) -> usize {
        self.data_rows
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|err| std::io::Error::new(err.error().kind(), err.error().to_string()).into())
    }

    fn write(&mut self, cells: &[String]) -> Result<()> {
        self.inner.write_record(cells)?;
        self.inner.flush()?;
        Ok(())
    }
}

fn rate_cell(rate: Option<f64>) -> String {
    rate.map(|r| r.to_string()).unwrap_or_default()
}
