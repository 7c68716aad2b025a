//! Per-category statistics over an annotated batch
//!
//! Used when tuning the metadata heuristics against a hand-sorted site: the
//! averages show how far apart the categories sit in temperature and range.

use serde::Serialize;
use std::collections::BTreeMap;
use thermoscan_core::{Severity, ThermalImageRecord};

/// A capture singled out by one measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extreme {
    pub filename: String,
    pub value: f64,
}

/// Aggregates for one device type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    /// Records with this device type
    pub count: usize,

    /// Records whose metadata passed validation
    pub measured: usize,

    pub avg_temp_max: Option<f64>,
    pub avg_range: Option<f64>,

    /// Highest maximum temperature
    pub hottest: Option<Extreme>,

    /// Largest max-min spread
    pub widest_range: Option<Extreme>,

    /// Records per severity; unrated records are counted in `unrated`
    pub severities: BTreeMap<Severity, usize>,
    pub unrated: usize,

    #[serde(skip)]
    sum_temp_max: f64,
    #[serde(skip)]
    sum_range: f64,
}

impl CategoryStats {
    fn add(&mut self, record: &ThermalImageRecord) {
        self.count += 1;

        match record.severity {
            Some(severity) => *self.severities.entry(severity).or_default() += 1,
            None => self.unrated += 1,
        }

        let Some(reading) = record.metadata.as_ref().and_then(|m| m.normalize().ok()) else {
            return;
        };
        let range = reading.range();

        self.measured += 1;
        self.sum_temp_max += reading.temp_max;
        self.sum_range += range;
        self.avg_temp_max = Some(self.sum_temp_max / self.measured as f64);
        self.avg_range = Some(self.sum_range / self.measured as f64);

        if self.hottest.as_ref().map_or(true, |h| reading.temp_max > h.value) {
            self.hottest = Some(Extreme {
                filename: record.filename.clone(),
                value: reading.temp_max,
            });
        }
        if self.widest_range.as_ref().map_or(true, |w| range > w.value) {
            self.widest_range = Some(Extreme {
                filename: record.filename.clone(),
                value: range,
            });
        }
    }

    /// Number of records with the given severity
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.severities.get(&severity).copied().unwrap_or(0)
    }
}

/// Statistics keyed by device type identifier.
///
/// Records without a device type are grouped under `unclassified`. On equal
/// extremes the record seen first is kept.
pub fn category_statistics<'a>(
    records: impl IntoIterator<Item = &'a ThermalImageRecord>,
) -> BTreeMap<String, CategoryStats> {
    let mut stats: BTreeMap<String, CategoryStats> = BTreeMap::new();

    for record in records {
        let key = record
            .device_type
            .as_ref()
            .map_or("unclassified", |t| t.as_str());
        stats.entry(key.to_string()).or_default().add(record);
    }

    stats
}
