//! Report batch engine
//!
//! Turns submitted captures into the ordered, annotated record sequence a
//! renderer consumes. Each capture passes through the same stages:
//!
//! 1. Classification (or the caller's forced category)
//! 2. Label lookup
//! 3. Severity from the category thresholds
//! 4. Narrative auto-fill for empty fields
//!
//! The batch is then ordered by category rank and filename. Stages keep no
//! state between captures, so the result does not depend on processing order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thermoscan_classifiers::{Classification, ClassificationSource, DeviceClassifier};
use thermoscan_core::{CategoryTable, DeviceType, Result, ThermalImageRecord, ThermalMetadata};
use thermoscan_policy::{NarrativeSelector, NarrativeTable, SeverityEvaluator};
use thermoscan_telemetry::{AuditTrail, MetricsCollector};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, DEFAULT_REPORT_TITLE};
use crate::orderer::ReportOrderer;

/// One capture handed to the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSubmission {
    /// Original capture filename
    pub filename: String,

    /// Decoded metadata; absent when decoding failed or was skipped
    pub metadata: Option<ThermalMetadata>,

    pub thermal_image_path: Option<PathBuf>,
    pub real_image_path: Option<PathBuf>,

    /// Decoder failure, if any
    pub decode_error: Option<String>,

    pub remark: String,
    pub conclusion: String,
    pub recommendation: String,

    /// Category chosen by the operator, bypassing classification
    pub forced_category: Option<String>,
}

impl CaptureSubmission {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: ThermalMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_images(mut self, thermal: impl Into<PathBuf>, real: Option<PathBuf>) -> Self {
        self.thermal_image_path = Some(thermal.into());
        self.real_image_path = real;
        self
    }

    /// Mark the capture as undecodable; any metadata is dropped
    pub fn with_decode_error(mut self, message: impl Into<String>) -> Self {
        self.decode_error = Some(message.into());
        self.metadata = None;
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn with_conclusion(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = conclusion.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_forced_category(mut self, category: impl Into<String>) -> Self {
        self.forced_category = Some(category.into());
        self
    }
}

/// A batch of captures for one report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRequest {
    /// Report title; the engine's default title when absent or blank
    pub title: Option<String>,

    /// Category forced on every capture that does not force its own
    pub forced_category: Option<String>,

    pub captures: Vec<CaptureSubmission>,
}

impl ReportRequest {
    pub fn new(captures: Vec<CaptureSubmission>) -> Self {
        Self {
            captures,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_forced_category(mut self, category: impl Into<String>) -> Self {
        self.forced_category = Some(category.into());
        self
    }
}

/// A capture the decoder could not read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureFailure {
    pub filename: String,
    pub message: String,
}

/// Ordered, annotated batch ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct ReportBatch {
    pub id: Uuid,
    pub title: String,
    pub generated_at: DateTime<Utc>,

    /// Annotated records in presentation order, degraded ones included
    pub records: Vec<ThermalImageRecord>,

    /// Captures whose decoding failed, in submission order
    pub failures: Vec<CaptureFailure>,

    /// Decision trail, when auditing is enabled
    #[serde(skip)]
    pub audit: Option<AuditTrail>,
}

impl ReportBatch {
    /// Whether any capture failed to decode
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Synchronous entry point: submissions in, ordered annotated records out
pub struct ReportEngine {
    table: Arc<CategoryTable>,
    classifier: DeviceClassifier,
    severity: SeverityEvaluator,
    narrative: NarrativeSelector,
    orderer: ReportOrderer,
    default_title: String,
    audit: bool,
    metrics: Option<MetricsCollector>,
}

impl ReportEngine {
    /// Create an engine over the given tables
    pub fn new(table: Arc<CategoryTable>, narratives: Arc<NarrativeTable>) -> Result<Self> {
        let classifier = DeviceClassifier::new(&table)?;

        Ok(Self {
            severity: SeverityEvaluator::new(table.clone()),
            narrative: NarrativeSelector::new(narratives),
            orderer: ReportOrderer::new(table.clone()),
            classifier,
            table,
            default_title: DEFAULT_REPORT_TITLE.to_string(),
            audit: false,
            metrics: None,
        })
    }

    /// Engine with the built-in tables
    pub fn builtin() -> Result<Self> {
        Self::new(
            Arc::new(CategoryTable::builtin()),
            Arc::new(NarrativeTable::builtin()),
        )
    }

    /// Engine configured from an [`EngineConfig`]; a fresh
    /// [`MetricsCollector`] is attached when `telemetry.metrics` is set
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let engine = Self::new(
            Arc::new(config.category_table()),
            Arc::new(config.narrative_table()),
        )?
        .with_default_title(config.report.default_title.clone())
        .with_audit(config.telemetry.audit);

        Ok(if config.telemetry.metrics {
            engine.with_metrics(MetricsCollector::new())
        } else {
            engine
        })
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Keep a hash-chained decision trail for each batch
    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit = enabled;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attached metrics collector, if any
    pub fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }

    pub fn category_table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    /// Annotate one capture.
    ///
    /// A forced category overrides classification; free text that is not
    /// one of the known identifiers is kept as an unrecognized device type
    /// and picks up the `device` entry's label and thresholds.
    pub fn annotate(
        &self,
        submission: CaptureSubmission,
        batch_forced: Option<&str>,
    ) -> (ThermalImageRecord, Classification) {
        let CaptureSubmission {
            filename,
            metadata,
            thermal_image_path,
            real_image_path,
            decode_error,
            remark,
            conclusion,
            recommendation,
            forced_category,
        } = submission;

        match metadata.as_ref().map(ThermalMetadata::normalize) {
            Some(Err(rejection)) => warn!(
                filename = %filename,
                reason = %rejection,
                "Metadata unusable for scoring"
            ),
            Some(Ok(reading)) if reading.is_inverted() => warn!(
                filename = %filename,
                temp_max = reading.temp_max,
                temp_min = reading.temp_min,
                "Max temperature below min temperature"
            ),
            _ => {}
        }

        let forced = forced_category
            .as_deref()
            .or(batch_forced)
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let (device_type, classification) = match forced {
            Some(forced) => {
                let device_type = DeviceType::parse(forced);
                if device_type.category().is_none() {
                    warn!(
                        filename = %filename,
                        forced = %forced,
                        "Unknown forced category; using generic thresholds"
                    );
                }
                let category = device_type
                    .category()
                    .unwrap_or_else(|| self.table.fallback().category);
                (
                    device_type,
                    Classification::new(category, ClassificationSource::Forced),
                )
            }
            None => {
                let classification = self
                    .classifier
                    .classify_detailed(&filename, metadata.as_ref());
                (DeviceType::from(classification.category), classification)
            }
        };

        let record = ThermalImageRecord {
            device_label: self.table.label(&device_type).to_string(),
            device_type: Some(device_type),
            filename,
            thermal_image_path,
            real_image_path,
            metadata,
            severity: None,
            remark,
            conclusion,
            recommendation,
            decode_error,
        };

        let record = self.narrative.fill(self.severity.apply(record));

        debug!(
            filename = %record.filename,
            category = %classification.category,
            source = classification.source.as_str(),
            severity = ?record.severity,
            "Capture annotated"
        );

        (record, classification)
    }

    /// Annotate and order a whole batch.
    ///
    /// Captures that failed to decode stay in the batch as degraded records
    /// (classified by filename only, no severity) and are also listed in
    /// [`ReportBatch::failures`].
    pub fn process(&self, request: ReportRequest) -> ReportBatch {
        let started = Instant::now();
        let ReportRequest {
            title,
            forced_category,
            captures,
        } = request;

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.default_title.clone());

        let mut audit = self.audit.then(AuditTrail::new);
        let mut failures = Vec::new();
        let mut records = Vec::with_capacity(captures.len());

        for submission in captures {
            if let Some(message) = &submission.decode_error {
                warn!(filename = %submission.filename, error = %message, "Capture failed to decode");
                failures.push(CaptureFailure {
                    filename: submission.filename.clone(),
                    message: message.clone(),
                });
                if let Some(trail) = audit.as_mut() {
                    trail.record_decode_failure(&submission.filename, message);
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_decode_failure();
                }
            }

            let (record, classification) = self.annotate(submission, forced_category.as_deref());

            if let Some(trail) = audit.as_mut() {
                trail.record_decision(&record, &classification);
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_capture(&classification.source, record.severity);
            }

            records.push(record);
        }

        let records = self.orderer.order(records);

        if let Some(metrics) = &self.metrics {
            metrics.record_batch(started.elapsed().as_micros() as u64);
        }

        info!(
            title = %title,
            records = records.len(),
            failures = failures.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Report batch annotated"
        );

        ReportBatch {
            id: Uuid::new_v4(),
            title,
            generated_at: Utc::now(),
            records,
            failures,
            audit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoscan_core::{DeviceCategory, Severity};

    fn engine() -> ReportEngine {
        ReportEngine::builtin().unwrap()
    }

    #[test]
    fn test_annotate_by_filename() {
        let submission = CaptureSubmission::new("CABLE_IR001.bmt")
            .with_metadata(ThermalMetadata::new(38.0, 34.0).with_emissivity(0.95));

        let (record, classification) = engine().annotate(submission, None);

        assert_eq!(record.device_type, Some(DeviceCategory::Cable.into()));
        assert_eq!(record.device_label, "AC/DC Cable");
        assert_eq!(record.severity, Some(Severity::Normal));
        assert_eq!(record.conclusion, "Connection point temperature is normal.");
        assert_eq!(classification.source.as_str(), "filename");
    }

    #[test]
    fn test_annotate_forced_category() {
        let submission = CaptureSubmission::new("CABLE_IR002.bmt")
            .with_metadata(ThermalMetadata::new(50.0, 30.0))
            .with_forced_category(" solar_panel ");

        let (record, classification) = engine().annotate(submission, None);

        assert_eq!(record.device_type, Some(DeviceCategory::SolarPanel.into()));
        assert_eq!(record.severity, Some(Severity::Warning));
        assert_eq!(classification.source, ClassificationSource::Forced);
    }

    #[test]
    fn test_annotate_unknown_forced_category() {
        let submission = CaptureSubmission::new("IR_0007.BMT")
            .with_metadata(ThermalMetadata::new(62.0, 30.0))
            .with_forced_category("inverter");

        let (record, classification) = engine().annotate(submission, None);

        assert_eq!(record.device_type, Some(DeviceType::parse("inverter")));
        assert_eq!(record.device_label, "Device");
        // device thresholds: 50 / 70
        assert_eq!(record.severity, Some(Severity::Warning));
        assert_eq!(classification.category, DeviceCategory::Device);
        assert_eq!(
            record.conclusion,
            "Localized temperature rise; possible contact fault, light overload, or shading."
        );
    }

    #[test]
    fn test_submission_forced_beats_batch_forced() {
        let engine = engine();

        let own = CaptureSubmission::new("IR_0001.BMT").with_forced_category("cabinet");
        let (record, _) = engine.annotate(own, Some("cable"));
        assert_eq!(record.device_type, Some(DeviceCategory::Cabinet.into()));

        let blank = CaptureSubmission::new("IR_0002.BMT").with_forced_category("  ");
        let (record, _) = engine.annotate(blank, Some("cable"));
        assert_eq!(record.device_type, Some(DeviceCategory::Cable.into()));
    }

    #[test]
    fn test_process_orders_and_titles() {
        let request = ReportRequest::new(vec![
            CaptureSubmission::new("A").with_forced_category("cable"),
            CaptureSubmission::new("Z").with_forced_category("solar_panel"),
        ]);

        let batch = engine().with_default_title("Site 271").process(request);

        assert_eq!(batch.title, "Site 271");
        let names: Vec<_> = batch.records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["Z", "A"]);
        assert!(!batch.is_partial());
        assert!(batch.audit.is_none());
    }

    #[test]
    fn test_blank_title_uses_default() {
        let batch = engine().process(ReportRequest::new(vec![]).with_title("   "));
        assert_eq!(batch.title, DEFAULT_REPORT_TITLE);
        assert!(batch.records.is_empty());
    }

    #[test]
    fn test_decode_failure_is_degraded_not_dropped() {
        let request = ReportRequest::new(vec![
            CaptureSubmission::new("PV_0001.BMT").with_decode_error("truncated header"),
            CaptureSubmission::new("IR_0002.BMT")
                .with_metadata(ThermalMetadata::new(72.0, 55.0).with_emissivity(0.85)),
        ]);

        let batch = engine().process(request);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.failures,
            vec![CaptureFailure {
                filename: "PV_0001.BMT".to_string(),
                message: "truncated header".to_string(),
            }]
        );

        let degraded = &batch.records[0];
        assert_eq!(degraded.filename, "PV_0001.BMT");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.device_type, Some(DeviceCategory::SolarPanel.into()));
        assert_eq!(degraded.severity, None);
        assert!(degraded.conclusion.is_empty());

        let scored = &batch.records[1];
        assert_eq!(scored.device_type, Some(DeviceCategory::Cable.into()));
        assert_eq!(scored.severity, Some(Severity::Warning));
    }

    #[test]
    fn test_audit_and_metrics() {
        let metrics = MetricsCollector::new();
        let engine = engine().with_audit(true).with_metrics(metrics.clone());

        let batch = engine.process(ReportRequest::new(vec![
            CaptureSubmission::new("CABINET_01.BMT").with_metadata(ThermalMetadata::new(85.0, 40.0)),
            CaptureSubmission::new("broken.BMT").with_decode_error("not radiometric"),
        ]));

        let trail = batch.audit.as_ref().unwrap();
        assert_eq!(trail.len(), 3);
        assert!(trail.verify());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.captures, 2);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.by_filename, 1);
        assert_eq!(snapshot.defaulted, 1);
        assert_eq!(snapshot.critical, 1);
        assert_eq!(snapshot.unrated, 1);
        assert_eq!(snapshot.batches, 1);
    }

    #[test]
    fn test_from_config_metrics_flag() {
        let mut config = EngineConfig::default();
        let engine = ReportEngine::from_config(&config).unwrap();
        let metrics = engine.metrics().unwrap().clone();

        engine.process(ReportRequest::new(vec![CaptureSubmission::new("PV_01.BMT")
            .with_metadata(ThermalMetadata::new(50.0, 30.0))]));
        assert_eq!(metrics.snapshot().captures, 1);
        assert_eq!(metrics.snapshot().batches, 1);

        config.telemetry.metrics = false;
        let engine = ReportEngine::from_config(&config).unwrap();
        assert!(engine.metrics().is_none());
    }
}
