use chrono::{DateTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fitsynth::config::DeviceProfile;
use fitsynth::export::FitActivityExporter;
use fitsynth::fit::{checksum, Endianness};
use fitsynth::geo::EARTH_RADIUS_KM;
use fitsynth::models::{ActivityMetadata, ActivityType};
use fitsynth::track::{Record, TrackBuilder, TrackSettings, Waypoint};

/// Performance benchmarks for track synthesis and FIT encoding
///
/// Route lengths grow from a short jog to a long ride so scaling issues in
/// the stepping loop or the encoder show up.

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

/// Zig-zag route of `km` kilometres with a waypoint every 250 m
fn create_route(km: f64) -> Vec<Waypoint> {
    let leg_deg = (0.25 / EARTH_RADIUS_KM).to_degrees();
    let legs = (km / 0.25).ceil() as usize;
    (0..=legs)
        .map(|i| {
            let lon_offset = if i % 2 == 0 { 0.0 } else { leg_deg * 0.2 };
            Waypoint::new(48.85 + leg_deg * i as f64, 2.35 + lon_offset, 35.0)
        })
        .collect()
}

fn synthesize(settings: &TrackSettings, route: &[Waypoint]) -> Vec<Record> {
    let mut builder = TrackBuilder::new(settings);
    builder.add_waypoints(route).unwrap();
    builder.finalize().unwrap();
    builder.into_records()
}

fn bench_track_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("Track Synthesis");
    let settings = TrackSettings::for_activity(ActivityType::Ride, start(), 25.0).with_seed(7);

    for &km in &[1.0, 10.0, 50.0] {
        let route = create_route(km);

        group.throughput(Throughput::Elements(route.len() as u64));
        group.bench_with_input(BenchmarkId::new("build_and_finalize", km), &route, |b, route| {
            b.iter(|| black_box(synthesize(&settings, route)));
        });
    }

    group.finish();
}

fn bench_fit_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("FIT Encoding");
    let settings = TrackSettings::for_activity(ActivityType::Ride, start(), 25.0).with_seed(7);
    let metadata = ActivityMetadata {
        name: "Benchmark Ride".to_string(),
        description: String::new(),
        activity_type: ActivityType::Ride,
        start: start(),
    };

    for &km in &[1.0, 10.0, 50.0] {
        let records = synthesize(&settings, &create_route(km));

        for endianness in [Endianness::Little, Endianness::Big] {
            let exporter = FitActivityExporter::new(DeviceProfile::default()).with_endianness(endianness);

            group.throughput(Throughput::Elements(records.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("encode_{}", endianness), km),
                &records,
                |b, records| {
                    b.iter(|| {
                        let mut bytes = Vec::with_capacity(records.len() * 40);
                        exporter.write(&metadata, records, &mut bytes).unwrap();
                        black_box(bytes)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_crc(c: &mut Criterion) {
    let mut group = c.benchmark_group("CRC-16");

    for &size in &[1_024usize, 64 * 1_024, 1_024 * 1_024] {
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("checksum", size), &data, |b, data| {
            b.iter(|| checksum(black_box(data)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_track_synthesis, bench_fit_encoding, bench_crc);
criterion_main!(benches);
