//! Exchange-rate snapshots
//!
//! Rates are "units of currency per 1 USD" and come from a dated CSV
//! (`Currency,ExchangeRate`): a local file, the latest file in a snapshot
//! directory, or a remote URL cached under `~/.commodity-usd/rates.json`.

use super::atomic_file::write_atomic;
use super::data_loader::{resolve_snapshot, snapshot_name};
use crate::config::{default_rate_cache_path, RATE_CACHE_TTL_SECS, REQUEST_TIMEOUT_SECS};
use crate::types::{CommodityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Read-only currency → rate map for one conversion run.
///
/// Keys are matched exactly as supplied (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRateTable {
    rates: HashMap<String, f64>,
}

impl ExchangeRateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.rates.contains_key(currency)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Entries sorted by currency code
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> =
            self.rates.iter().map(|(c, r)| (c.as_str(), *r)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Parse a `Currency,ExchangeRate` CSV.
    ///
    /// Rows whose rate is not a finite number are skipped, which leaves that
    /// currency unresolvable. A repeated code keeps its last rate.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = HashMap::new();
        for row in reader.deserialize::<RateRow>() {
            let row = row?;
            match row.rate.parse::<f64>() {
                Ok(rate) if rate.is_finite() => {
                    rates.insert(row.currency, rate);
                }
                _ => warn!(
                    "Skipping exchange rate for {:?}: {:?} is not a number",
                    row.currency, row.rate
                ),
            }
        }
        Ok(Self { rates })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Self::from_csv_reader(File::open(path)?)
    }
}

impl FromIterator<(String, f64)> for ExchangeRateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency", alias = "currency")]
    currency: String,
    #[serde(rename = "ExchangeRate", alias = "exchange_rate", alias = "rate")]
    rate: String,
}

/// Where the exchange rates for a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSource {
    /// A CSV file, or a directory of dated CSV snapshots
    Path(PathBuf),
    /// A remote CSV, cached locally
    Url(String),
}

/// A loaded rate table and the snapshot it came from
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    pub table: ExchangeRateTable,
    pub source: String,
}

/// Cached remote rate snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct RateCache {
    /// Unix timestamp when the snapshot was fetched
    pub fetched_at: i64,
    /// URL the snapshot was fetched from
    pub source: String,
    pub rates: ExchangeRateTable,
}

impl RateCache {
    /// Check if the cache has expired
    pub fn is_expired(&self) -> bool {
        unix_now() - self.fetched_at > RATE_CACHE_TTL_SECS
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Loads exchange-rate snapshots
#[derive(Debug, Default)]
pub struct RateService {
    /// `None` resolves to `~/.commodity-usd/rates.json` on first remote load
    cache_path: Option<PathBuf>,
}

impl RateService {
    /// Create a RateService using the default cache path
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RateService with a custom cache path
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self {
            cache_path: Some(cache_path),
        }
    }

    /// Cache location; only remote sources need it
    fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => default_rate_cache_path(),
        }
    }

    pub fn load(&self, source: &RateSource) -> Result<RateSnapshot> {
        match source {
            RateSource::Path(path) => {
                let file = resolve_snapshot(path)?;
                let table = ExchangeRateTable::from_csv_path(&file)?;
                info!("Loaded {} exchange rates from {}", table.len(), file.display());
                Ok(RateSnapshot {
                    table,
                    source: snapshot_name(&file),
                })
            }
            RateSource::Url(url) => {
                let table = self.load_or_fetch(url)?;
                Ok(RateSnapshot {
                    table,
                    source: url.clone(),
                })
            }
        }
    }

    /// Serve a fresh cache for `url`, refresh a stale one, and fall back to
    /// the stale copy when the fetch fails.
    fn load_or_fetch(&self, url: &str) -> Result<ExchangeRateTable> {
        let cache_path = self.cache_path()?;
        let cached = Self::load_cache(&cache_path)
            .ok()
            .filter(|cache| cache.source == url);

        if let Some(cache) = cached {
            if !cache.is_expired() {
                debug!("Using cached exchange rates for {}", url);
                return Ok(cache.rates);
            }
            match Self::fetch_rates(url) {
                Ok(fresh) => {
                    Self::store(&cache_path, url, &fresh);
                    return Ok(fresh);
                }
                Err(e) => {
                    warn!("Refreshing exchange rates failed, using expired cache: {}", e);
                    return Ok(cache.rates);
                }
            }
        }

        let fresh = Self::fetch_rates(url).map_err(|e| {
            CommodityError::Rates(format!("Failed to fetch exchange rates: {}", e))
        })?;
        Self::store(&cache_path, url, &fresh);
        Ok(fresh)
    }

    fn store(cache_path: &Path, url: &str, rates: &ExchangeRateTable) {
        let cache = RateCache {
            fetched_at: unix_now(),
            source: url.to_string(),
            rates: rates.clone(),
        };
        if let Err(e) = Self::save_cache(cache_path, &cache) {
            warn!("Could not write rate cache {}: {}", cache_path.display(), e);
        }
    }

    /// Load cache from disk
    fn load_cache(cache_path: &Path) -> Result<RateCache> {
        let content = fs::read_to_string(cache_path)?;
        let cache: RateCache = serde_json::from_str(&content)
            .map_err(|e| CommodityError::Rates(format!("Invalid cache format: {}", e)))?;
        Ok(cache)
    }

    /// Save cache to disk
    fn save_cache(cache_path: &Path, cache: &RateCache) -> Result<()> {
        let content = serde_json::to_vec_pretty(cache)
            .map_err(|e| CommodityError::Rates(format!("Serialization failed: {}", e)))?;
        write_atomic(cache_path, &content)
    }

    /// Fetch a rate CSV over HTTP
    fn fetch_rates(url: &str) -> std::result::Result<ExchangeRateTable, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| format!("HTTP client error: {}", e))?;

        let body = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| format!("HTTP request failed: {}", e))?
            .text()
            .map_err(|e| format!("Reading response failed: {}", e))?;

        let table = ExchangeRateTable::from_csv_reader(body.as_bytes())
            .map_err(|e| format!("CSV parse error: {}", e))?;
        info!("Fetched {} exchange rates from {}", table.len(), url);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Nothing listens on the discard port, so fetches fail fast
    const DEAD_URL: &str = "http://127.0.0.1:9/rates.csv";

    const RATES_CSV: &str = "\
Currency,ExchangeRate
EUR,0.92
CHF,0.88
MYR,4.7
";

    fn write_cache(path: &Path, source: &str, fetched_at: i64) {
        let cache = RateCache {
            fetched_at,
            source: source.to_string(),
            rates: [("EUR".to_string(), 0.5)].into_iter().collect(),
        };
        RateService::save_cache(path, &cache).unwrap();
    }

    // ========== CSV parsing ==========

    #[test]
    fn test_from_csv_basic() {
        let table = ExchangeRateTable::from_csv_reader(RATES_CSV.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("EUR"), Some(0.92));
        assert_eq!(table.get("eur"), None);
    }

    #[test]
    fn test_from_csv_skips_bad_rates() {
        let csv = "Currency,ExchangeRate\nEUR,0.92\nGBP,n/a\nJPY,\nXAU,inf\n";
        let table = ExchangeRateTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 1);
        assert!(!table.contains("GBP"));
        assert!(!table.contains("XAU"));
    }

    #[test]
    fn test_from_csv_keeps_zero_rate() {
        let csv = "Currency,ExchangeRate\nCHF,0\n";
        let table = ExchangeRateTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get("CHF"), Some(0.0));
    }

    #[test]
    fn test_from_csv_last_duplicate_wins() {
        let csv = "Currency,ExchangeRate\nEUR,0.90\nEUR,0.95\n";
        let table = ExchangeRateTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get("EUR"), Some(0.95));
    }

    #[test]
    fn test_from_csv_missing_column_errors() {
        let csv = "Code,Value\nEUR,0.92\n";
        assert!(ExchangeRateTable::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_sorted_entries() {
        let table = ExchangeRateTable::from_csv_reader(RATES_CSV.as_bytes()).unwrap();
        let codes: Vec<&str> = table.sorted().into_iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["CHF", "EUR", "MYR"]);
    }

    // ========== Path sources ==========

    #[test]
    fn test_load_from_snapshot_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("exchange_rates");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("rates_20250430.csv"), "Currency,ExchangeRate\nEUR,0.5\n").unwrap();
        fs::write(dir.join("rates_20250501.csv"), RATES_CSV).unwrap();
        let service = RateService::with_cache_path(temp.path().join("rates.json"));

        let snapshot = service.load(&RateSource::Path(dir)).unwrap();

        assert_eq!(snapshot.source, "rates_20250501.csv");
        assert_eq!(snapshot.table.get("EUR"), Some(0.92));
    }

    #[test]
    fn test_path_source_never_resolves_cache_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rates.csv");
        fs::write(&path, RATES_CSV).unwrap();
        let service = RateService::new();

        let snapshot = service.load(&RateSource::Path(path)).unwrap();

        assert_eq!(snapshot.table.len(), 3);
        assert!(service.cache_path.is_none());
    }

    // ========== Remote cache ==========

    #[test]
    fn test_cache_is_expired_after_1h() {
        let cache = RateCache {
            fetched_at: unix_now() - 3601,
            source: DEAD_URL.into(),
            rates: ExchangeRateTable::default(),
        };
        assert!(cache.is_expired());
    }

    #[test]
    fn test_cache_is_valid_within_1h() {
        let cache = RateCache {
            fetched_at: unix_now() - 1800,
            source: DEAD_URL.into(),
            rates: ExchangeRateTable::default(),
        };
        assert!(!cache.is_expired());
    }

    #[test]
    fn test_fresh_cache_skips_fetch() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("rates.json");
        write_cache(&cache_path, DEAD_URL, unix_now());
        let service = RateService::with_cache_path(cache_path);

        let snapshot = service.load(&RateSource::Url(DEAD_URL.into())).unwrap();

        assert_eq!(snapshot.table.get("EUR"), Some(0.5));
        assert_eq!(snapshot.source, DEAD_URL);
    }

    #[test]
    fn test_expired_cache_used_when_fetch_fails() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("rates.json");
        write_cache(&cache_path, DEAD_URL, 0);
        let service = RateService::with_cache_path(cache_path);

        let snapshot = service.load(&RateSource::Url(DEAD_URL.into())).unwrap();

        assert_eq!(snapshot.table.get("EUR"), Some(0.5));
    }

    #[test]
    fn test_cache_for_other_url_is_ignored() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("rates.json");
        write_cache(&cache_path, "http://127.0.0.1:9/other.csv", unix_now());
        let service = RateService::with_cache_path(cache_path);

        let result = service.load(&RateSource::Url(DEAD_URL.into()));

        assert!(matches!(result, Err(CommodityError::Rates(_))));
    }

    #[test]
    fn test_no_cache_and_failed_fetch_errors() {
        let temp = TempDir::new().unwrap();
        let service = RateService::with_cache_path(temp.path().join("rates.json"));

        let result = service.load(&RateSource::Url(DEAD_URL.into()));

        assert!(matches!(result, Err(CommodityError::Rates(_))));
    }

    #[test]
    fn test_corrupt_cache_is_treated_as_missing() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("rates.json");
        fs::write(&cache_path, "not valid json{{{").unwrap();
        let service = RateService::with_cache_path(cache_path);

        assert!(service.load(&RateSource::Url(DEAD_URL.into())).is_err());
    }

    #[test]
    fn test_explicit_cache_path_wins() {
        let service = RateService::with_cache_path(PathBuf::from("/tmp/x/rates.json"));
        assert_eq!(
            service.cache_path().unwrap(),
            PathBuf::from("/tmp/x/rates.json")
        );
    }

    #[test]
    fn test_cache_load_and_save() {
        let temp = TempDir::new().unwrap();
        let cache_path = temp.path().join("nested").join("rates.json");
        write_cache(&cache_path, DEAD_URL, 12345);

        let loaded = RateService::load_cache(&cache_path).unwrap();

        assert_eq!(loaded.fetched_at, 12345);
        assert_eq!(loaded.rates.get("EUR"), Some(0.5));
    }
}
