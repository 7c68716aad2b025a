//! Latency benchmarks for classification
//!
//! Run with: cargo bench -p thermoscan-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use thermoscan_classifiers::{DeviceClassifier, FilenameMatcher, MetadataScorer};
use thermoscan_core::{CategoryTable, ThermalMetadata};

/// Benchmark the filename keyword stage
fn benchmark_filename_matcher(c: &mut Criterion) {
    let matcher =
        FilenameMatcher::new(&CategoryTable::builtin()).expect("Failed to build filename matcher");

    let test_cases = vec![
        ("no_match", "IR_0001.BMT"),
        ("early_match", "PV_String_03.BMT"),
        ("late_match", "Site_271_Thiết bị khác_0042.BMT"),
    ];

    let mut group = c.benchmark_group("Filename_Matcher");
    group.sample_size(100);

    for (name, filename) in test_cases {
        group.bench_with_input(BenchmarkId::new("match", name), &filename, |b, filename| {
            b.iter(|| matcher.match_filename(black_box(filename)))
        });
    }

    group.finish();
}

/// Benchmark the metadata heuristics with and without a histogram
fn benchmark_metadata_scorer(c: &mut Criterion) {
    let scorer = MetadataScorer::new();

    let bare = ThermalMetadata::new(72.0, 55.0).with_emissivity(0.85);
    let with_histogram = bare
        .clone()
        .with_histogram((0..256).map(|i| (i * 7 % 113) as u32).collect());

    let mut group = c.benchmark_group("Metadata_Scorer");
    group.sample_size(100);

    group.bench_function("no_histogram", |b| {
        b.iter(|| scorer.classify_metadata(black_box(&bare)))
    });

    group.bench_function("histogram_256_bins", |b| {
        b.iter(|| scorer.classify_metadata(black_box(&with_histogram)))
    });

    group.finish();
}

/// Full classification of a batch of captures
fn benchmark_device_classifier(c: &mut Criterion) {
    let classifier =
        DeviceClassifier::new(&CategoryTable::builtin()).expect("Failed to build classifier");

    let captures: Vec<(String, ThermalMetadata)> = (0..200)
        .map(|i| {
            let filename = if i % 3 == 0 {
                format!("CABLE_{:04}.BMT", i)
            } else {
                format!("IR_{:04}.BMT", i)
            };
            let metadata = ThermalMetadata::new(30.0 + (i % 50) as f64, 25.0)
                .with_histogram(vec![(i % 17) as u32; 64]);
            (filename, metadata)
        })
        .collect();

    c.bench_function("classify_batch_200", |b| {
        b.iter(|| {
            for (filename, metadata) in &captures {
                black_box(classifier.classify(filename, Some(metadata)));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_filename_matcher,
    benchmark_metadata_scorer,
    benchmark_device_classifier
);
criterion_main!(benches);
