//! `commodity-usd convert` subcommand

use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;

use super::RateSourceArgs;
use commodity_usd::services::sink::stream_sink;
use commodity_usd::services::{OutputFormat, Pipeline, PipelineRequest, RateService, TableStore};
use commodity_usd::types::{CommodityError, Result};

/// Convert a commodity snapshot to USD
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Commodity CSV file or snapshot directory (latest file is used)
    #[arg(long, value_name = "FILE|DIR")]
    pub records: PathBuf,

    #[command(flatten)]
    pub rate_source: RateSourceArgs,

    /// Table store to upsert rows into [default: ~/.commodity-usd/commodity_prices_usd.csv]
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Write rows to stdout instead of a table store
    #[arg(long, conflicts_with = "out")]
    pub stdout: bool,

    /// Row format for --stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Capture instant (RFC 3339), defaults to now
    #[arg(long, value_name = "RFC3339")]
    pub captured_at: Option<DateTime<Utc>>,

    /// Print the batch summary as JSON
    #[arg(long, conflicts_with = "stdout")]
    pub json: bool,
}

impl ConvertArgs {
    fn request(&self) -> Result<PipelineRequest> {
        Ok(PipelineRequest {
            records: self.records.clone(),
            rates: self.rate_source.source()?,
            captured_at: self.captured_at,
        })
    }

    pub fn run(self) -> Result<()> {
        let request = self.request()?;
        let pipeline = Pipeline::new(RateService::new());

        let output = if self.stdout {
            let mut sink = stream_sink(self.format, std::io::stdout().lock());
            pipeline.run(&request, sink.as_mut())?
        } else {
            let mut store = match self.out {
                Some(path) => TableStore::with_path(path),
                None => TableStore::new()?,
            };
            pipeline.run(&request, &mut store)?
        };

        if self.json {
            let json = serde_json::to_string_pretty(&output.summary)
                .map_err(|e| CommodityError::Parse(e.to_string()))?;
            println!("{}", json);
        } else {
            eprintln!("{}", output.summary);
        }

        Ok(())
    }
}
