//! Property tests for severity and narrative stages

use proptest::prelude::*;
use std::sync::Arc;
use thermoscan_core::{CategoryTable, DeviceCategory, DeviceType, ThermalImageRecord, ThermalMetadata};
use thermoscan_policy::{NarrativeSelector, SeverityEvaluator};

fn any_category() -> impl Strategy<Value = DeviceCategory> {
    prop::sample::select(DeviceCategory::ALL.to_vec())
}

proptest! {
    #[test]
    fn severity_is_monotonic_in_temperature(
        category in any_category(),
        a in -40.0f64..200.0,
        b in -40.0f64..200.0,
    ) {
        let evaluator = SeverityEvaluator::new(Arc::new(CategoryTable::builtin()));
        let device_type = DeviceType::from(category);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let low_severity = evaluator.evaluate(&device_type, low);
        let high_severity = evaluator.evaluate(&device_type, high);

        prop_assert!(low_severity.is_some());
        prop_assert!(low_severity <= high_severity);
    }

    #[test]
    fn narrative_fill_never_overwrites(
        category in any_category(),
        temp_max in 0.0f64..150.0,
        conclusion in "[a-zA-Z ]{1,30}",
    ) {
        let evaluator = SeverityEvaluator::new(Arc::new(CategoryTable::builtin()));
        let selector = NarrativeSelector::default();

        let record = ThermalImageRecord::new("IR_0001.BMT")
            .with_metadata(ThermalMetadata::new(temp_max, 20.0))
            .with_device_type(category)
            .with_conclusion(conclusion.clone());

        let record = selector.fill(evaluator.apply(record));

        prop_assert_eq!(record.conclusion, conclusion);
        prop_assert!(!record.recommendation.is_empty());
    }
}
