//! Classifier trait and common types

use serde::Serialize;
use thermoscan_core::{DeviceCategory, ThermalMetadata};

/// Trait for all device classifiers
///
/// A classifier may abstain by returning `None`; the device classifier
/// decides what happens next.
pub trait Classifier: Send + Sync {
    /// Classify one capture
    fn classify(&self, capture: &CaptureInput<'_>) -> Option<Classification>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Inputs available for classifying a single capture
#[derive(Debug, Clone, Copy)]
pub struct CaptureInput<'a> {
    /// Original capture filename
    pub filename: &'a str,

    /// Decoded metadata, if decoding succeeded
    pub metadata: Option<&'a ThermalMetadata>,
}

impl<'a> CaptureInput<'a> {
    pub fn new(filename: &'a str, metadata: Option<&'a ThermalMetadata>) -> Self {
        Self { filename, metadata }
    }
}

/// Result of classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Chosen category
    pub category: DeviceCategory,

    /// Which stage produced the category
    pub source: ClassificationSource,
}

impl Classification {
    pub fn new(category: DeviceCategory, source: ClassificationSource) -> Self {
        Self { category, source }
    }
}

/// Which stage decided a classification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ClassificationSource {
    /// A filename keyword matched
    Filename { keyword: String },

    /// Metadata heuristic scoring
    Metadata { scores: ScoreCard },

    /// Category supplied by the caller
    Forced,

    /// Nothing usable; generic `device`
    Default,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filename { .. } => "filename",
            Self::Metadata { .. } => "metadata",
            Self::Forced => "forced",
            Self::Default => "default",
        }
    }
}

/// Per-category points accumulated by the metadata heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreCard {
    points: [u32; 4],
}

impl ScoreCard {
    /// Empty card
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points to a category
    pub fn add(&mut self, category: DeviceCategory, points: u32) {
        self.points[category.index()] += points;
    }

    /// Points for a category
    pub fn get(&self, category: DeviceCategory) -> u32 {
        self.points[category.index()]
    }

    /// Categories with their points, in priority order
    pub fn entries(&self) -> impl Iterator<Item = (DeviceCategory, u32)> + '_ {
        DeviceCategory::ALL.iter().map(|c| (*c, self.get(*c)))
    }

    /// Highest-scoring category.
    ///
    /// Only a strictly higher score displaces the current leader, so ties go
    /// to the category listed first in [`DeviceCategory::ALL`].
    pub fn leader(&self) -> DeviceCategory {
        let mut best = DeviceCategory::ALL[0];
        for (category, points) in self.entries() {
            if points > self.get(best) {
                best = category;
            }
        }
        best
    }
}

impl Serialize for ScoreCard {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(DeviceCategory::ALL.len()))?;
        for (category, points) in self.entries() {
            map.serialize_entry(category.as_str(), &points)?;
        }
        map.end()
    }
}
