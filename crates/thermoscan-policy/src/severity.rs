//! Severity evaluation against per-category temperature thresholds

use std::sync::Arc;
use thermoscan_core::{
    CategoryTable, DeviceCategory, DeviceType, Severity, ThermalImageRecord, Thresholds,
};
use tracing::debug;

/// Maps a device type and maximum temperature to a severity
#[derive(Debug, Clone)]
pub struct SeverityEvaluator {
    table: Arc<CategoryTable>,
}

impl SeverityEvaluator {
    /// Create an evaluator over the given category table
    pub fn new(table: Arc<CategoryTable>) -> Self {
        Self { table }
    }

    /// Thresholds that apply to a device type (`device` entry when unknown)
    pub fn thresholds(&self, device_type: &DeviceType) -> Thresholds {
        self.table.thresholds(device_type)
    }

    /// Severity for a maximum temperature.
    ///
    /// Returns `None` when `temp_max` is not a finite number.
    pub fn evaluate(&self, device_type: &DeviceType, temp_max: f64) -> Option<Severity> {
        if !temp_max.is_finite() {
            return None;
        }

        let Thresholds { warning, critical } = self.thresholds(device_type);

        let severity = if temp_max >= critical {
            Severity::Critical
        } else if temp_max >= warning {
            Severity::Warning
        } else {
            Severity::Normal
        };

        Some(severity)
    }

    /// Severity stage of the record pipeline.
    ///
    /// Leaves the severity unset when the record has no finite maximum
    /// temperature. A record without a device type is judged as `device`.
    pub fn apply(&self, mut record: ThermalImageRecord) -> ThermalImageRecord {
        let device_type = record
            .device_type
            .clone()
            .unwrap_or(DeviceType::Known(DeviceCategory::Device));

        record.severity = record
            .temp_max()
            .and_then(|temp_max| self.evaluate(&device_type, temp_max));

        match record.severity {
            Some(severity) => debug!(
                filename = %record.filename,
                device_type = %device_type,
                severity = %severity,
                "Severity assigned"
            ),
            None => debug!(
                filename = %record.filename,
                "No finite max temperature; severity left unset"
            ),
        }

        record
    }
}
