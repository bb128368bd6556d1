use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{AlignedPair, NormalizedRow, Speaker};

/// Open an output file for appending, optionally truncating it first
pub fn open_append(path: &Path, truncate: bool) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(!truncate)
        .truncate(truncate)
        .open(path)
        .with_context(|| format!("Failed to open file: {:?}", path))?;
    Ok(BufWriter::new(file))
}

/// Create (or truncate) an output file
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    Ok(BufWriter::new(file))
}

/// Writes aligned pairs, one tab-separated record per line
pub struct PairWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> PairWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_pair(&mut self, pair: &AlignedPair) -> Result<()> {
        writeln!(self.inner, "{}", pair).context("Failed to write pair")?;
        self.written += 1;
        Ok(())
    }

    /// Number of pairs written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush().context("Failed to flush output")?;
        Ok(self.inner)
    }
}

/// Destination for the normalizer's finished turns
pub trait RowSink {
    /// Accept a finished turn spoken by `speaker`
    fn write_row(&mut self, speaker: Speaker, row: &NormalizedRow) -> Result<()>;

    /// Close the current group unconditionally
    fn write_separator(&mut self) -> Result<()>;

    /// Close the current group unless it is already closed
    fn end_group(&mut self) -> Result<()>;

    /// Rows accepted so far
    fn rows(&self) -> usize;
}

/// Writes `label,text` rows with blank lines between groups
pub struct RowWriter<W: Write> {
    inner: W,
    rows: usize,
    separators: usize,
    rows_since_separator: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            rows: 0,
            separators: 0,
            rows_since_separator: 0,
        }
    }

    pub fn separators(&self) -> usize {
        self.separators
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush().context("Failed to flush output")?;
        Ok(self.inner)
    }
}

/// The speaker is not written; the CSV carries only `label,text`
impl<W: Write> RowSink for RowWriter<W> {
    fn write_row(&mut self, _speaker: Speaker, row: &NormalizedRow) -> Result<()> {
        writeln!(self.inner, "{}", row).context("Failed to write row")?;
        self.rows += 1;
        self.rows_since_separator += 1;
        Ok(())
    }

    fn write_separator(&mut self) -> Result<()> {
        writeln!(self.inner).context("Failed to write separator")?;
        self.separators += 1;
        self.rows_since_separator = 0;
        Ok(())
    }

    fn end_group(&mut self) -> Result<()> {
        if self.rows_since_separator > 0 {
            self.write_separator()?;
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.rows
    }
}

/// Summary of one run, written as JSON with `--report`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<T: Serialize> {
    /// Subcommand that produced the report
    pub stage: String,
    pub generated_at: DateTime<Utc>,
    pub stats: T,
}

impl<T: Serialize> RunReport<T> {
    pub fn new(stage: &str, stats: T) -> Self {
        Self {
            stage: stage.to_string(),
            generated_at: Utc::now(),
            stats,
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}
