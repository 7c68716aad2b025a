//! Thermoscan Classifiers
//!
//! Decides which kind of equipment a thermal capture shows.
//!
//! Classification runs in stages with a fixed priority:
//! 1. Filename keywords ([`FilenameMatcher`])
//! 2. Metadata heuristics ([`MetadataScorer`]) when both temperatures are usable
//! 3. The generic `device` category
//!
//! All stages are pure and synchronous: the same input always yields the same
//! category.

pub mod classifier;
pub mod device;
pub mod evaluation;
pub mod filename;
pub mod metadata;

pub use classifier::{CaptureInput, Classification, ClassificationSource, Classifier, ScoreCard};
pub use device::DeviceClassifier;
pub use evaluation::{evaluate, CategoryAccuracy, EvaluationReport, LabelledSample, Misclassification};
pub use filename::{FilenameMatch, FilenameMatcher};
pub use metadata::MetadataScorer;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{CaptureInput, Classification, ClassificationSource, Classifier};
    pub use crate::device::DeviceClassifier;
    pub use crate::filename::FilenameMatcher;
    pub use crate::metadata::MetadataScorer;
}
