//! Property tests for the device classifier

use proptest::prelude::*;
use thermoscan_classifiers::DeviceClassifier;
use thermoscan_core::{CategoryTable, DeviceCategory, ThermalMetadata};

fn classifier() -> DeviceClassifier {
    DeviceClassifier::new(&CategoryTable::builtin()).unwrap()
}

fn any_temperature() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        Just(Some(f64::INFINITY)),
        (-40.0f64..200.0).prop_map(Some),
    ]
}

fn any_metadata() -> impl Strategy<Value = Option<ThermalMetadata>> {
    let metadata = (
        any_temperature(),
        any_temperature(),
        proptest::option::of(-1.0f64..2.0),
        proptest::collection::vec(0u32..5000, 0..64),
    )
        .prop_map(|(temp_max, temp_min, emissivity, histogram)| ThermalMetadata {
            temp_max,
            temp_min,
            emissivity,
            histogram,
        });

    proptest::option::of(metadata)
}

proptest! {
    #[test]
    fn classify_is_total_and_repeatable(filename in ".{0,40}", metadata in any_metadata()) {
        let classifier = classifier();

        let first = classifier.classify_detailed(&filename, metadata.as_ref());
        let second = classifier.classify_detailed(&filename, metadata.as_ref());

        prop_assert!(DeviceCategory::ALL.contains(&first.category));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn filename_keyword_overrides_metadata(
        prefix in "[0-9]{0,6}",
        metadata in any_metadata(),
    ) {
        let filename = format!("{}_CABLE_IR.bmt", prefix);
        prop_assert_eq!(
            classifier().classify(&filename, metadata.as_ref()),
            DeviceCategory::Cable
        );
    }
}

#[test]
fn test_cable_filename_with_contradicting_metadata() {
    let metadata = ThermalMetadata::new(38.0, 34.0).with_emissivity(0.95);
    assert_eq!(
        classifier().classify("CABLE_IR001.bmt", Some(&metadata)),
        DeviceCategory::Cable
    );
}
