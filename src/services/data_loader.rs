//! Commodity record loading
//!
//! Reads the scraper's CSV output (`category,name,price,currency,unit`).
//! A directory path resolves to its latest dated snapshot.

use crate::types::{CommodityError, CommodityRecord, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Records read from one snapshot file
#[derive(Debug)]
pub struct RecordSnapshot {
    pub records: Vec<CommodityRecord>,
    /// File name of the snapshot
    pub source: String,
}

/// Loads commodity records from a CSV file or a snapshot directory
pub struct DataLoaderService {
    path: PathBuf,
}

impl DataLoaderService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<RecordSnapshot> {
        let file = resolve_snapshot(&self.path)?;
        let records = read_records(File::open(&file)?)?;
        info!(
            "Loaded {} commodity records from {}",
            records.len(),
            file.display()
        );
        Ok(RecordSnapshot {
            records,
            source: snapshot_name(&file),
        })
    }
}

/// Use `path` as is, or its latest CSV snapshot when it is a directory
pub fn resolve_snapshot(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        latest_csv(path)
    } else {
        Ok(path.to_path_buf())
    }
}

/// Pick the CSV file whose name sorts last.
///
/// Snapshot names embed their capture date (`commodity_data_2025-05-01.csv`),
/// so the greatest name is the newest snapshot.
pub fn latest_csv(dir: &Path) -> Result<PathBuf> {
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.csv");
    let latest = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| CommodityError::Config(format!("Invalid snapshot pattern: {}", e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .max_by(|a, b| a.file_name().cmp(&b.file_name()))
        .ok_or_else(|| CommodityError::NoSnapshot(dir.to_path_buf()))?;

    debug!("Latest snapshot in {}: {}", dir.display(), latest.display());
    Ok(latest)
}

pub fn snapshot_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse commodity records from CSV with a header row.
///
/// Values are kept as written; only header names are trimmed.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<CommodityRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<CommodityRecord>().enumerate() {
        let record = split_unit_label(row?);
        if record.name.trim().is_empty() {
            // Header is line 1
            warn!("Commodity row on line {} has an empty name", idx + 2);
        }
        records.push(record);
    }
    Ok(records)
}

/// Split a combined "CURRENCY/unit" label when no unit column was filled.
///
/// The commodity scrape reads labels like "USD/Bu" and splits them at the
/// first slash; rows stored before that split get the same treatment here.
fn split_unit_label(mut record: CommodityRecord) -> CommodityRecord {
    if record.unit.trim().is_empty() {
        if let Some((currency, unit)) = record.currency.split_once('/') {
            let (currency, unit) = (currency.trim().to_string(), unit.trim().to_string());
            record.currency = currency;
            record.unit = unit;
        }
    }
    record
}
