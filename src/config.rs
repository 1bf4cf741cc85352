//! Paths and constants shared by the pipeline stages

use crate::types::{CommodityError, Result};
use std::path::PathBuf;

/// Data directory name under the user's home
pub const APP_DIR: &str = ".commodity-usd";

/// Cached remote exchange-rate snapshot
pub const RATE_CACHE_FILE: &str = "rates.json";

/// Default table store
pub const TABLE_FILE: &str = "commodity_prices_usd.csv";

/// Rate cache TTL in seconds (1 hour)
pub const RATE_CACHE_TTL_SECS: i64 = 3600;

/// HTTP request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Batch capture stamp format (`YYYYMMDD`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d";

/// Get the data directory (~/.commodity-usd)
pub fn data_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| CommodityError::Config("Failed to get home directory".into()))?
        .home_dir()
        .to_path_buf();
    Ok(home.join(APP_DIR))
}

pub fn default_rate_cache_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(RATE_CACHE_FILE))
}

pub fn default_table_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(TABLE_FILE))
}
