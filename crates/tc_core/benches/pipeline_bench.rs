use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tc_core::besttrack::tracks_from_archive;
use tc_core::cache::{decompress_and_deserialize, serialize_and_compress, StoredFeatures};
use tc_core::calibration::drifting_storm_scenario;
use tc_core::detection::detect_cyclones;
use tc_core::features::extract_features;
use tc_core::matching::match_tracks;
use tc_core::CalibrationParams;

fn bench_feature_extraction(c: &mut Criterion) {
    let scenario = drifting_storm_scenario().expect("scenario construction is closed-form");
    let cube = scenario.cube;

    c.bench_function("extract_features_30x11x40", |b| {
        b.iter(|| {
            let features = extract_features(black_box(&cube)).unwrap();
            black_box(features.expected_shape())
        })
    });
}

fn bench_detection(c: &mut Criterion) {
    let scenario = drifting_storm_scenario().expect("scenario construction is closed-form");
    let features = extract_features(&scenario.cube).unwrap();
    let params = CalibrationParams::default();

    c.bench_function("detect_cyclones_30x11x40", |b| {
        b.iter(|| {
            let cyclones = detect_cyclones(black_box(&features), black_box(&params)).unwrap();
            black_box(cyclones.len())
        })
    });
}

fn bench_matching(c: &mut Criterion) {
    let scenario = drifting_storm_scenario().expect("scenario construction is closed-form");
    let features = extract_features(&scenario.cube).unwrap();
    let cyclones = detect_cyclones(&features, &CalibrationParams::default()).unwrap();
    let references = tracks_from_archive(
        scenario.archive,
        scenario.window_start,
        scenario.window_end,
        4,
    )
    .unwrap();

    c.bench_function("match_tracks_1x1", |b| {
        b.iter(|| {
            let match_set = match_tracks(black_box(&cyclones), black_box(&references));
            black_box(match_set.matches.len())
        })
    });
}

fn bench_store_round_trip(c: &mut Criterion) {
    let scenario = drifting_storm_scenario().expect("scenario construction is closed-form");
    let features = extract_features(&scenario.cube).unwrap();
    let stored = StoredFeatures::new(features);
    let packed = serialize_and_compress(&stored).unwrap();

    c.bench_function("store_serialize_30x11x40", |b| {
        b.iter(|| {
            let bytes = serialize_and_compress(black_box(&stored)).unwrap();
            black_box(bytes.len())
        })
    });

    c.bench_function("store_deserialize_30x11x40", |b| {
        b.iter(|| {
            let restored = decompress_and_deserialize(black_box(&packed)).unwrap();
            black_box(restored.version)
        })
    });
}

criterion_group!(
    pipeline,
    bench_feature_extraction,
    bench_detection,
    bench_matching,
    bench_store_round_trip
);
criterion_main!(pipeline);
