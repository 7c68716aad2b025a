//! Accuracy evaluation of a classifier against labelled captures
//!
//! Used to check the metadata heuristics against site folders sorted by hand
//! (run the [`MetadataScorer`](crate::MetadataScorer) on its own so filenames
//! cannot give the answer away).

use crate::classifier::{CaptureInput, Classifier};
use serde::Serialize;
use std::collections::BTreeMap;
use thermoscan_core::{DeviceCategory, ThermalMetadata};
use tracing::info;

/// A capture with a known category
#[derive(Debug, Clone)]
pub struct LabelledSample {
    pub filename: String,
    pub metadata: Option<ThermalMetadata>,
    pub expected: DeviceCategory,
}

impl LabelledSample {
    pub fn new(
        filename: impl Into<String>,
        metadata: Option<ThermalMetadata>,
        expected: DeviceCategory,
    ) -> Self {
        Self {
            filename: filename.into(),
            metadata,
            expected,
        }
    }
}

/// Correct/total counts for one expected category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryAccuracy {
    pub correct: usize,
    pub total: usize,
}

impl CategoryAccuracy {
    /// Fraction correct, 0.0 when empty
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// A sample the classifier got wrong or abstained on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Misclassification {
    pub filename: String,
    pub expected: DeviceCategory,
    pub predicted: Option<DeviceCategory>,
    pub temp_max: Option<f64>,
    pub range: Option<f64>,
}

/// Result of an evaluation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    /// Name of the evaluated classifier
    pub classifier: String,

    /// Accuracy keyed by expected category
    pub per_category: BTreeMap<DeviceCategory, CategoryAccuracy>,

    /// Wrong or missing predictions, in input order
    pub misclassified: Vec<Misclassification>,
}

impl EvaluationReport {
    /// Totals across all categories
    pub fn overall(&self) -> CategoryAccuracy {
        self.per_category
            .values()
            .fold(CategoryAccuracy::default(), |acc, c| CategoryAccuracy {
                correct: acc.correct + c.correct,
                total: acc.total + c.total,
            })
    }
}

/// Run a classifier over labelled samples
pub fn evaluate(classifier: &dyn Classifier, samples: &[LabelledSample]) -> EvaluationReport {
    let mut report = EvaluationReport {
        classifier: classifier.name().to_string(),
        ..Default::default()
    };

    for sample in samples {
        let capture = CaptureInput::new(&sample.filename, sample.metadata.as_ref());
        let predicted = classifier.classify(&capture).map(|c| c.category);

        let entry = report.per_category.entry(sample.expected).or_default();
        entry.total += 1;

        if predicted == Some(sample.expected) {
            entry.correct += 1;
        } else {
            let temp_max = sample.metadata.as_ref().and_then(|m| m.temp_max);
            let temp_min = sample.metadata.as_ref().and_then(|m| m.temp_min);

            report.misclassified.push(Misclassification {
                filename: sample.filename.clone(),
                expected: sample.expected,
                predicted,
                temp_max,
                range: temp_max.zip(temp_min).map(|(max, min)| max - min),
            });
        }
    }

    let overall = report.overall();
    info!(
        classifier = %report.classifier,
        correct = overall.correct,
        total = overall.total,
        accuracy = overall.ratio(),
        "Classifier evaluation finished"
    );

    report
}
