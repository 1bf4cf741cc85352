//! Row sinks for converted records

use crate::types::{CommodityError, ConvertedRecord, Result};
use std::io::Write;

/// Destination for one batch of converted rows
pub trait RowSink {
    /// Sink name for logs (e.g., "csv", "table-store")
    fn name(&self) -> &str;

    /// Persist rows, returning how many were accepted
    fn write_rows(&mut self, rows: &[ConvertedRecord]) -> Result<usize>;
}

/// Row serialization format for stream sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Build a stream sink for `format`
pub fn stream_sink<'a, W: Write + 'a>(format: OutputFormat, writer: W) -> Box<dyn RowSink + 'a> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(writer)),
        OutputFormat::Json => Box::new(JsonSink::new(writer)),
    }
}

/// CSV rows with a header; unknown prices become empty cells
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| CommodityError::Io(e.into_error()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn name(&self) -> &str {
        "csv"
    }

    fn write_rows(&mut self, rows: &[ConvertedRecord]) -> Result<usize> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(rows.len())
    }
}

/// Pretty JSON array; unknown prices become `null`
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for JsonSink<W> {
    fn name(&self) -> &str {
        "json"
    }

    fn write_rows(&mut self, rows: &[ConvertedRecord]) -> Result<usize> {
        serde_json::to_writer_pretty(&mut self.writer, rows)
            .map_err(|e| CommodityError::Parse(format!("Serialization failed: {}", e)))?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(rows.len())
    }
}

/// In-memory sink
impl RowSink for Vec<ConvertedRecord> {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_rows(&mut self, rows: &[ConvertedRecord]) -> Result<usize> {
        self.extend_from_slice(rows);
        Ok(rows.len())
    }
}
