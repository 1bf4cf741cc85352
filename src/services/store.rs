//! File-backed `commodity_prices_usd` table
//!
//! Batches are upserted on `(trading_goods_name, timestamp)`, so re-running
//! a day replaces that day's rows instead of duplicating them. Writers
//! serialize on an exclusive lock of the sidecar `<table>.lock` file.

use super::atomic_file::write_atomic;
use super::sink::RowSink;
use crate::config::default_table_path;
use crate::types::{CommodityError, ConvertedRecord, Result};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct TableStore {
    path: PathBuf,
}

impl TableStore {
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(default_table_path()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file writers lock, `<table>.lock`
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Block until this process is the only writer. The lock is released
    /// when the returned file is dropped.
    fn lock_writers(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock.lock_exclusive()
            .map_err(|e| CommodityError::Store(format!("Failed to acquire write lock: {}", e)))?;
        Ok(lock)
    }

    /// Read all stored rows. A missing table is empty.
    /// Uses shared file lock for concurrent read safety.
    pub fn load(&self) -> Result<Vec<ConvertedRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()
            .map_err(|e| CommodityError::Store(format!("Failed to acquire read lock: {}", e)))?;

        let rows: std::result::Result<Vec<ConvertedRecord>, csv::Error> =
            csv::Reader::from_reader(&file).deserialize().collect();

        let _ = file.unlock();
        rows.map_err(|e| {
            CommodityError::Store(format!("Corrupted table {}: {}", self.path.display(), e))
        })
    }

    /// Insert a batch, replacing stored rows with the same key.
    ///
    /// Within the batch the last row for a key wins. Stored rows keep their
    /// order; batch rows are appended in input order. Returns the number of
    /// batch rows written. The whole load-merge-save runs under the writers
    /// lock, so concurrent upserts never drop each other's rows.
    pub fn upsert(&self, rows: &[ConvertedRecord]) -> Result<usize> {
        let lock = self.lock_writers()?;

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut batch: Vec<&ConvertedRecord> =
            rows.iter().rev().filter(|row| seen.insert(row.key())).collect();
        batch.reverse();

        let mut merged: Vec<ConvertedRecord> = self
            .load()?
            .into_iter()
            .filter(|row| !seen.contains(&row.key()))
            .collect();
        merged.extend(batch.iter().map(|row| (*row).clone()));

        self.save(&merged)?;
        let _ = lock.unlock();
        info!(
            "Upserted {} rows into {} ({} total)",
            batch.len(),
            self.path.display(),
            merged.len()
        );
        Ok(batch.len())
    }

    pub fn clear(&self) -> Result<()> {
        let _lock = self.lock_writers()?;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Serialize and atomically replace the table. Callers hold the writers lock.
    fn save(&self, rows: &[ConvertedRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let content = writer
            .into_inner()
            .map_err(|e| CommodityError::Store(format!("Serialization failed: {}", e)))?;

        write_atomic(&self.path, &content).map_err(|e| {
            CommodityError::Store(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

impl RowSink for TableStore {
    fn name(&self) -> &str {
        "table-store"
    }

    fn write_rows(&mut self, rows: &[ConvertedRecord]) -> Result<usize> {
        self.upsert(rows)
    }
}
