//! One conversion run: load records and rates, convert, hand rows to a sink

use super::converter::{batch_timestamp, convert_batch_at};
use super::data_loader::DataLoaderService;
use super::rates::{RateService, RateSource};
use super::sink::RowSink;
use crate::types::{BatchSummary, ConvertedRecord, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::info;

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Commodity CSV file or snapshot directory
    pub records: PathBuf,
    pub rates: RateSource,
    /// Capture instant; defaults to now
    pub captured_at: Option<DateTime<Utc>>,
}

/// Result of one run
#[derive(Debug)]
pub struct PipelineOutput {
    pub rows: Vec<ConvertedRecord>,
    pub summary: BatchSummary,
}

pub struct Pipeline {
    rate_service: RateService,
}

impl Pipeline {
    pub fn new(rate_service: RateService) -> Self {
        Self { rate_service }
    }

    /// Run the batch and write it to `sink`.
    ///
    /// Only input failures (unreadable snapshots, unreachable rates) and sink
    /// failures abort the run; per-record conversion failures end up as
    /// unknown prices in the output.
    pub fn run(
        &self,
        request: &PipelineRequest,
        sink: &mut dyn RowSink,
    ) -> Result<PipelineOutput> {
        let records = DataLoaderService::new(request.records.clone()).load()?;
        let rates = self.rate_service.load(&request.rates)?;

        let captured_at = request.captured_at.unwrap_or_else(Utc::now);
        let timestamp = batch_timestamp(captured_at);
        let rows = convert_batch_at(&records.records, &rates.table, captured_at);

        let written = sink.write_rows(&rows)?;
        info!("Wrote {} rows to {} sink", written, sink.name());

        let mut summary = BatchSummary::from_rows(&rows, &timestamp);
        summary.written = written;
        summary.records_source = records.source;
        summary.rates_source = rates.source;

        Ok(PipelineOutput { rows, summary })
    }
}
