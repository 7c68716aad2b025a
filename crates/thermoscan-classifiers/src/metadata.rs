//! Metadata heuristic classifier
//!
//! Best-effort scoring over the temperature spread, the maximum temperature,
//! the emissivity, and the shape of the pixel-temperature histogram. Each rule
//! adds points independently; the category with the most points wins and ties
//! go to the earlier category in [`DeviceCategory::ALL`].
//!
//! Rough field observations behind the rules:
//! - PV panels: medium max temperature, medium spread, even histogram
//! - Cables/connections: hot, wide spread, a sharp localized peak
//! - Cabinets/indoor: cooler, very narrow spread

use crate::classifier::{CaptureInput, Classification, ClassificationSource, Classifier, ScoreCard};
use thermoscan_core::{DeviceCategory, ThermalMetadata, ThermalReading};
use tracing::debug;

use DeviceCategory::{Cabinet, Cable, Device, SolarPanel};

const WIDE_RANGE: f64 = 15.0;
const NARROW_RANGE: f64 = 8.0;
const WIDE_RANGE_HOT_MAX: f64 = 45.0;
const NARROW_RANGE_WARM_MAX: f64 = 35.0;
const HOT_MAX: f64 = 50.0;
const COOL_MAX: f64 = 35.0;
const METALLIC_EMISSIVITY: f64 = 0.90;
const SHARP_PEAK_RATIO: f64 = 6.0;
const MODERATE_PEAK_RATIO: f64 = 3.0;
const WIDE_SPREAD_RATIO: f64 = 0.5;
const MEDIUM_SPREAD_RATIO: f64 = 0.25;

/// Heuristic multi-rule scorer over thermal metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataScorer;

impl MetadataScorer {
    pub fn new() -> Self {
        Self
    }

    /// Apply every rule to a validated reading
    pub fn score(&self, reading: &ThermalReading) -> ScoreCard {
        let mut card = ScoreCard::new();
        // Generic fallback bias
        card.add(Device, 1);

        range_rule(reading, &mut card);
        max_temperature_rule(reading, &mut card);
        emissivity_rule(reading, &mut card);

        if !reading.histogram.is_empty() {
            histogram_shape_rule(&reading.histogram, &mut card);
            histogram_spread_rule(&reading.histogram, &mut card);
        }

        card
    }

    /// Category with the highest score for a validated reading
    pub fn classify_reading(&self, reading: &ThermalReading) -> DeviceCategory {
        self.score(reading).leader()
    }

    /// Validate the metadata and score it; `None` if it cannot be used
    pub fn classify_metadata(&self, metadata: &ThermalMetadata) -> Option<Classification> {
        match metadata.normalize() {
            Ok(reading) => {
                let scores = self.score(&reading);
                Some(Classification::new(
                    scores.leader(),
                    ClassificationSource::Metadata { scores },
                ))
            }
            Err(reason) => {
                debug!(reason = %reason, "Metadata not usable for scoring");
                None
            }
        }
    }
}

impl Classifier for MetadataScorer {
    fn classify(&self, capture: &CaptureInput<'_>) -> Option<Classification> {
        self.classify_metadata(capture.metadata?)
    }

    fn name(&self) -> &str {
        "metadata"
    }
}

fn range_rule(reading: &ThermalReading, card: &mut ScoreCard) {
    let range = reading.range();

    if range > WIDE_RANGE {
        // Sky reflection on a panel, or a hot cable
        if reading.temp_max > WIDE_RANGE_HOT_MAX {
            card.add(Cable, 2);
        } else {
            card.add(SolarPanel, 2);
        }
    } else if range < NARROW_RANGE {
        card.add(Cabinet, 2);
        if reading.temp_max > NARROW_RANGE_WARM_MAX {
            card.add(Cable, 1);
        }
    } else {
        card.add(SolarPanel, 1);
        card.add(Cabinet, 1);
    }
}

fn max_temperature_rule(reading: &ThermalReading, card: &mut ScoreCard) {
    if reading.temp_max >= HOT_MAX {
        card.add(Cable, 2);
    } else if reading.temp_max < COOL_MAX {
        card.add(Cabinet, 1);
        card.add(SolarPanel, 1);
    }
}

fn emissivity_rule(reading: &ThermalReading, card: &mut ScoreCard) {
    // Low emissivity means a reflective, usually metallic, surface.
    if reading.emissivity < METALLIC_EMISSIVITY {
        card.add(Cable, 1);
    } else {
        card.add(SolarPanel, 1);
    }
}

/// How concentrated the heat is: tallest bin over the mean bin (mean floored at 1)
pub fn peak_ratio(histogram: &[u32]) -> f64 {
    if histogram.is_empty() {
        return 0.0;
    }

    let peak = histogram.iter().copied().max().unwrap_or(0) as f64;
    let total: u64 = histogram.iter().map(|&v| u64::from(v)).sum();
    let average = total as f64 / histogram.len() as f64;

    peak / average.max(1.0)
}

/// Fraction of bins holding more than one unit
pub fn active_ratio(histogram: &[u32]) -> f64 {
    if histogram.is_empty() {
        return 0.0;
    }

    let active = histogram.iter().filter(|&&v| v > 1).count();
    active as f64 / histogram.len() as f64
}

fn histogram_shape_rule(histogram: &[u32], card: &mut ScoreCard) {
    let ratio = peak_ratio(histogram);

    if ratio > SHARP_PEAK_RATIO {
        // Localized hot spot
        card.add(Cable, 3);
    } else if ratio > MODERATE_PEAK_RATIO {
        card.add(Cabinet, 2);
        card.add(Cable, 1);
    } else {
        // Even distribution over a large surface
        card.add(SolarPanel, 2);
    }
}

fn histogram_spread_rule(histogram: &[u32], card: &mut ScoreCard) {
    let ratio = active_ratio(histogram);

    if ratio > WIDE_SPREAD_RATIO {
        card.add(SolarPanel, 2);
    } else if ratio > MEDIUM_SPREAD_RATIO {
        card.add(Cabinet, 1);
    } else {
        card.add(Cable, 1);
    }
}
