//! Core types for Thermoscan

use crate::category::DeviceType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Emissivity assumed when a capture reports none or an invalid value
pub const DEFAULT_EMISSIVITY: f64 = 0.95;

/// Fault severity derived from the maximum temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Normal, Severity::Warning, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata record as handed over by the capture decoder.
///
/// Every field may be missing or out of range; use [`ThermalMetadata::normalize`]
/// before feeding it to any decision logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalMetadata {
    /// Highest radiometric reading in °C
    #[serde(default)]
    pub temp_max: Option<f64>,

    /// Lowest radiometric reading in °C
    #[serde(default)]
    pub temp_min: Option<f64>,

    /// Emissivity the camera applied
    #[serde(default)]
    pub emissivity: Option<f64>,

    /// Pixel counts per temperature bin
    #[serde(default)]
    pub histogram: Vec<u32>,
}

impl ThermalMetadata {
    /// Metadata with both temperatures and the default emissivity
    pub fn new(temp_max: f64, temp_min: f64) -> Self {
        Self {
            temp_max: Some(temp_max),
            temp_min: Some(temp_min),
            emissivity: None,
            histogram: Vec::new(),
        }
    }

    pub fn with_emissivity(mut self, emissivity: f64) -> Self {
        self.emissivity = Some(emissivity);
        self
    }

    pub fn with_histogram(mut self, histogram: Vec<u32>) -> Self {
        self.histogram = histogram;
        self
    }

    /// Maximum temperature, if present and finite
    pub fn finite_temp_max(&self) -> Option<f64> {
        self.temp_max.filter(|t| t.is_finite())
    }

    /// Validate and normalize into a [`ThermalReading`].
    ///
    /// Both temperatures must be present and finite. An inverted pair is kept
    /// as-is and scores as a narrow range; see [`ThermalReading::is_inverted`].
    /// Emissivity outside `(0, 1]` is replaced by [`DEFAULT_EMISSIVITY`].
    pub fn normalize(&self) -> Result<ThermalReading, MetadataRejection> {
        let temp_max = self.temp_max.ok_or(MetadataRejection::MissingTemperature)?;
        let temp_min = self.temp_min.ok_or(MetadataRejection::MissingTemperature)?;

        if !temp_max.is_finite() || !temp_min.is_finite() {
            return Err(MetadataRejection::NonFiniteTemperature);
        }

        let emissivity = self
            .emissivity
            .filter(|e| e.is_finite() && *e > 0.0 && *e <= 1.0)
            .unwrap_or(DEFAULT_EMISSIVITY);

        Ok(ThermalReading {
            temp_max,
            temp_min,
            emissivity,
            histogram: self.histogram.clone(),
        })
    }
}

/// Why decoded metadata could not be used for scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetadataRejection {
    MissingTemperature,
    NonFiniteTemperature,
}

impl fmt::Display for MetadataRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTemperature => f.write_str("temperature missing"),
            Self::NonFiniteTemperature => f.write_str("temperature is not a finite number"),
        }
    }
}

/// Validated thermal reading used by the scoring rules
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalReading {
    pub temp_max: f64,
    pub temp_min: f64,
    pub emissivity: f64,
    pub histogram: Vec<u32>,
}

impl ThermalReading {
    /// Spread between the hottest and coldest reading
    pub fn range(&self) -> f64 {
        self.temp_max - self.temp_min
    }

    /// Max temperature reported below the min; the range is negative
    pub fn is_inverted(&self) -> bool {
        self.temp_max < self.temp_min
    }
}

/// One capture in a report batch.
///
/// Created after decoding, then passed by value through classification,
/// severity evaluation, and narrative selection before rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalImageRecord {
    /// Original capture filename
    pub filename: String,

    /// False-color thermal image extracted by the decoder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal_image_path: Option<PathBuf>,

    /// Visible-light image extracted by the decoder, if the capture had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_image_path: Option<PathBuf>,

    /// Decoded metadata; absent when decoding failed
    pub metadata: Option<ThermalMetadata>,

    /// Computed or forced device type
    pub device_type: Option<DeviceType>,

    /// Display label for the device type
    #[serde(default)]
    pub device_label: String,

    /// Computed severity; unset when no finite max temperature exists
    pub severity: Option<Severity>,

    /// Operator remark
    #[serde(default)]
    pub remark: String,

    /// Conclusion text, user-supplied or auto-filled
    #[serde(default)]
    pub conclusion: String,

    /// Recommendation text, user-supplied or auto-filled
    #[serde(default)]
    pub recommendation: String,

    /// Decoder failure description, if decoding failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl ThermalImageRecord {
    /// Create a record for a capture
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

    pub fn with_device_type(mut self, device_type: impl Into<DeviceType>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
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

    pub fn temp_max(&self) -> Option<f64> {
        self.metadata.as_ref().and_then(|m| m.temp_max)
    }

    pub fn temp_min(&self) -> Option<f64> {
        self.metadata.as_ref().and_then(|m| m.temp_min)
    }

    pub fn emissivity(&self) -> Option<f64> {
        self.metadata.as_ref().and_then(|m| m.emissivity)
    }

    /// Whether the decoder failed on this capture
    pub fn is_degraded(&self) -> bool {
        self.decode_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults_emissivity() {
        for emissivity in [None, Some(0.0), Some(-0.2), Some(1.5), Some(f64::NAN)] {
            let metadata = ThermalMetadata {
                emissivity,
                ..ThermalMetadata::new(40.0, 30.0)
            };
            let reading = metadata.normalize().unwrap();
            assert_eq!(reading.emissivity, DEFAULT_EMISSIVITY);
        }

        let reading = ThermalMetadata::new(40.0, 30.0)
            .with_emissivity(1.0)
            .normalize()
            .unwrap();
        assert_eq!(reading.emissivity, 1.0);
        assert_eq!(reading.range(), 10.0);
    }

    #[test]
    fn test_normalize_rejects_missing_and_non_finite() {
        let missing = ThermalMetadata {
            temp_max: Some(40.0),
            ..Default::default()
        };
        assert_eq!(
            missing.normalize().unwrap_err(),
            MetadataRejection::MissingTemperature
        );

        let nan = ThermalMetadata::new(f64::NAN, 20.0);
        assert_eq!(
            nan.normalize().unwrap_err(),
            MetadataRejection::NonFiniteTemperature
        );

    }

    #[test]
    fn test_normalize_keeps_inverted_pair() {
        let reading = ThermalMetadata::new(20.0, 40.0).normalize().unwrap();
        assert!(reading.is_inverted());
        assert_eq!(reading.range(), -20.0);

        let reading = ThermalMetadata::new(40.0, 40.0).normalize().unwrap();
        assert!(!reading.is_inverted());
    }

    #[test]
    fn test_metadata_deserialize_partial() {
        let json = r#"{"temp_max": 52.5, "histogram": [0, 3, 9]}"#;
        let metadata: ThermalMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.finite_temp_max(), Some(52.5));
        assert_eq!(metadata.temp_min, None);
        assert_eq!(metadata.histogram, vec![0, 3, 9]);
    }

    #[test]
    fn test_record_builder() {
        let record = ThermalImageRecord::new("IR_0042.BMT")
            .with_metadata(ThermalMetadata::new(61.0, 30.0).with_emissivity(0.93))
            .with_conclusion("pre-existing");

        assert_eq!(record.temp_max(), Some(61.0));
        assert_eq!(record.emissivity(), Some(0.93));
        assert_eq!(record.conclusion, "pre-existing");
        assert!(record.severity.is_none());
        assert!(!record.is_degraded());
    }
}
