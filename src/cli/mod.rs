mod convert;

use clap::{Args, Parser, Subcommand};
use commodity_usd::services::{normalize_currency, RateService, RateSource};
use commodity_usd::types::{CommodityError, Result};
use convert::ConvertArgs;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Normalize commodity prices and convert them to USD
#[derive(Parser)]
#[command(name = "commodity-usd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a commodity snapshot to USD and store the rows
    Convert(ConvertArgs),

    /// Print the canonical code for currency labels
    Normalize {
        #[arg(required = true, value_name = "LABEL")]
        labels: Vec<String>,
    },

    /// Show the exchange-rate table a run would use
    Rates {
        #[command(flatten)]
        source: RateSourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Exactly one exchange-rate source
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RateSourceArgs {
    /// Exchange-rate CSV file or snapshot directory
    #[arg(long, value_name = "FILE|DIR")]
    rates: Option<PathBuf>,

    /// Remote exchange-rate CSV (cached for an hour)
    #[arg(long, value_name = "URL")]
    rates_url: Option<String>,
}

impl RateSourceArgs {
    pub fn source(&self) -> Result<RateSource> {
        match (&self.rates, &self.rates_url) {
            (Some(path), _) => Ok(RateSource::Path(path.clone())),
            (None, Some(url)) => Ok(RateSource::Url(url.clone())),
            (None, None) => Err(CommodityError::Config(
                "Provide --rates or --rates-url".into(),
            )),
        }
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Convert(args) => Ok(args.run()?),
            Commands::Normalize { labels } => {
                for label in labels {
                    println!("{}\t{}", label, normalize_currency(&label));
                }
                Ok(())
            }
            Commands::Rates { source, json } => {
                let snapshot = RateService::new().load(&source.source()?)?;
                if json {
                    let rates: BTreeMap<&str, f64> = snapshot.table.sorted().into_iter().collect();
                    println!("{}", serde_json::to_string_pretty(&rates)?);
                } else {
                    println!("# {} ({} rates)", snapshot.source, snapshot.table.len());
                    for (code, rate) in snapshot.table.sorted() {
                        println!("{}\t{}", code, rate);
                    }
                }
                Ok(())
            }
        }
    }
}
