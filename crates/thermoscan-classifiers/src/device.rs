//! Device classifier: filename keywords first, metadata heuristics second,
//! generic `device` last.

use crate::classifier::{CaptureInput, Classification, ClassificationSource, Classifier};
use crate::filename::FilenameMatcher;
use crate::metadata::MetadataScorer;
use thermoscan_core::{CategoryTable, DeviceCategory, Result, ThermalMetadata};
use tracing::debug;

/// Orchestrates the classification stages.
///
/// Classification is total: every capture gets exactly one category.
pub struct DeviceClassifier {
    filename: FilenameMatcher,
    metadata: MetadataScorer,
}

impl DeviceClassifier {
    /// Create a classifier over the given category table
    pub fn new(table: &CategoryTable) -> Result<Self> {
        Ok(Self {
            filename: FilenameMatcher::new(table)?,
            metadata: MetadataScorer::new(),
        })
    }

    /// Classify a capture and report which stage decided
    pub fn classify_detailed(
        &self,
        filename: &str,
        metadata: Option<&ThermalMetadata>,
    ) -> Classification {
        let capture = CaptureInput::new(filename, metadata);

        let classification = self
            .filename
            .classify(&capture)
            .or_else(|| self.metadata.classify(&capture))
            .unwrap_or_else(|| {
                Classification::new(DeviceCategory::Device, ClassificationSource::Default)
            });

        debug!(
            filename,
            category = %classification.category,
            stage = classification.source.as_str(),
            "Capture classified"
        );

        classification
    }

    /// Classify a capture
    pub fn classify(&self, filename: &str, metadata: Option<&ThermalMetadata>) -> DeviceCategory {
        self.classify_detailed(filename, metadata).category
    }

    /// Metadata-only classification, ignoring the filename
    pub fn classify_by_metadata(&self, metadata: &ThermalMetadata) -> Option<DeviceCategory> {
        self.metadata.classify_metadata(metadata).map(|c| c.category)
    }

    /// The filename stage
    pub fn filename_matcher(&self) -> &FilenameMatcher {
        &self.filename
    }

    /// The metadata stage
    pub fn metadata_scorer(&self) -> &MetadataScorer {
        &self.metadata
    }
}

impl Classifier for DeviceClassifier {
    fn classify(&self, capture: &CaptureInput<'_>) -> Option<Classification> {
        Some(self.classify_detailed(capture.filename, capture.metadata))
    }

    fn name(&self) -> &str {
        "device"
    }
}
