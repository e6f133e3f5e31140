//! Content-keyed memoization of normalized tables and chart data.
//!
//! The key is a SHA-256 over the raw file bytes, the settings that change
//! normalization and the gender detector's fingerprint. Re-running on an
//! unchanged file is free while an edited file, a different reference date or
//! a different name dictionary recomputes.

use crate::charts::{filter_by_barreau, prepare_chart_data};
use crate::config::Settings;
use crate::error::{Result, StatsError};
use crate::gender::GenderDetector;
use crate::loader::{read_raw, LoadReport};
use crate::normalize::process_data;
use crate::types::{ChartData, LawyerRecord};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

pub fn cache_key(content: &[u8], settings: &Settings, detector_fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.update(b"\0");
    hasher.update(settings.normalization_fingerprint().as_bytes());
    hasher.update(b"\0");
    hasher.update(detector_fingerprint.as_bytes());
    hex::encode(hasher.finalize())
}

/// First characters of a key, for log lines.
fn short_key(key: &str) -> String {
    key.chars().take(12).collect()
}

#[derive(Debug, Clone)]
pub struct CachedTable {
    pub key: String,
    pub records: Rc<Vec<LawyerRecord>>,
    pub report: LoadReport,
}

#[derive(Debug, Default)]
pub struct PipelineCache {
    tables: HashMap<String, CachedTable>,
    charts: HashMap<(String, String, usize, i32, i32), Rc<ChartData>>,
    hits: usize,
    misses: usize,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized table for `key`, computing it with `compute` on a miss.
    pub fn table_or_insert_with<F>(&mut self, key: String, compute: F) -> Result<CachedTable>
    where
        F: FnOnce() -> Result<Vec<LawyerRecord>>,
    {
        if let Some(hit) = self.tables.get(&key) {
            self.hits += 1;
            debug!("cache hit for table {}", short_key(&key));
            return Ok(hit.clone());
        }
        self.misses += 1;
        let records = compute()?;
        let entry = CachedTable {
            report: LoadReport::from_records(&records),
            records: Rc::new(records),
            key: key.clone(),
        };
        self.tables.insert(key, entry.clone());
        Ok(entry)
    }

    /// Read, normalize and memoize a registry file. Detectors that keep the
    /// default empty [`GenderDetector::fingerprint`] are assumed interchangeable.
    pub fn load<D: GenderDetector + ?Sized>(
        &mut self,
        path: &Path,
        sheet: Option<&str>,
        detector: &D,
        settings: &Settings,
    ) -> Result<CachedTable> {
        let content =
            fs::read(path).map_err(|e| StatsError::io(path.display().to_string(), e))?;
        let mut key = cache_key(&content, settings, &detector.fingerprint());
        if let Some(sheet) = sheet {
            key.push(':');
            key.push_str(sheet);
        }
        self.table_or_insert_with(key, || {
            info!("normalizing {}", path.display());
            let raw = read_raw(path, sheet)?;
            Ok(process_data(&raw, detector, settings))
        })
    }

    /// Chart tables for one bar selection of a cached table.
    pub fn charts(
        &mut self,
        table: &CachedTable,
        selection: &str,
        settings: &Settings,
    ) -> Rc<ChartData> {
        let key = (
            table.key.clone(),
            selection.to_string(),
            settings.top_n,
            settings.flow_year_min,
            settings.flow_year_max,
        );
        if let Some(hit) = self.charts.get(&key) {
            self.hits += 1;
            return Rc::clone(hit);
        }
        self.misses += 1;
        let subset = filter_by_barreau(&table.records, selection);
        let data = Rc::new(prepare_chart_data(&subset, settings));
        self.charts.insert(key, Rc::clone(&data));
        data
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.charts.clear();
    }
}
