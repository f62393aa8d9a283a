use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pitwall::telemetry::{build_lap_summary, restore_chronology, tag_batch};
use pitwall::{Sample, SessionManager, TrackTable};
use std::time::Duration;

const LAP_LENGTH: f64 = 1500.0;
const TRACK: i32 = 101;

// Roughly one hour of 60Hz packets with a lap every ~90 seconds and a new
// car every quarter of the batch
fn synthetic_batch(points: usize) -> Vec<Sample> {
    (0..points)
        .map(|point| {
            let dist = point as f64 * 0.5 - 5.0;
            Sample {
                timestamp_ms: (point * 16) as u32,
                car_ordinal: 5 + (point * 4 / points.max(1)) as i32,
                track_ordinal: Some(TRACK),
                dist_traveled: dist,
                lap_no: if dist < 0.0 {
                    0
                } else {
                    (dist / LAP_LENGTH) as i32
                },
                last_lap_time: 90.0,
                cur_lap_time: (point % 5400) as f64 / 60.0,
                ..Sample::default()
            }
        })
        .collect()
}

// Every fourth packet delivered late, as UDP reordering tends to look
fn shuffled_batch(points: usize) -> Vec<Sample> {
    let mut batch = synthetic_batch(points);
    for chunk in batch.chunks_mut(4) {
        chunk.reverse();
    }
    batch
}

fn bench_reordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("reordering");

    group.bench_function("restore_chronology_100k_shuffled", |b| {
        b.iter_batched(
            || shuffled_batch(100_000),
            |batch| black_box(restore_chronology(batch)),
            criterion::BatchSize::LargeInput,
        );
    });

    group.bench_function("restore_chronology_100k_sorted", |b| {
        b.iter_batched(
            || synthetic_batch(100_000),
            |batch| black_box(restore_chronology(batch)),
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");

    group.bench_function("tag_batch_100k", |b| {
        b.iter_batched(
            || synthetic_batch(100_000),
            |batch| black_box(tag_batch(batch, "bench.csv", LAP_LENGTH, 0)),
            criterion::BatchSize::LargeInput,
        );
    });

    group.bench_function("lap_summary_100k", |b| {
        let (rows, _) = tag_batch(synthetic_batch(100_000), "bench.csv", LAP_LENGTH, 0);
        b.iter(|| black_box(build_lap_summary(&rows, LAP_LENGTH)));
    });

    group.finish();
}

fn bench_full_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    group.bench_function("manager_ingest_10k", |b| {
        b.iter_batched(
            || synthetic_batch(10_000),
            |batch| {
                let mut tracks = TrackTable::new();
                tracks.insert(TRACK, LAP_LENGTH);
                let mut manager = SessionManager::new(tracks);
                manager
                    .ingest(batch, "bench.csv")
                    .expect("bench batch is valid");
                black_box(manager.lap_summary().len())
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(50);
    targets = bench_reordering, bench_segmentation, bench_full_ingest
}
criterion_main!(benches);
