use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pitwall::replay::ReplaySession;
use pitwall::source::{LapRecord, SampleTable, SessionData, SessionKind, WeatherTable};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

const DRIVERS: usize = 20;
const LAPS: usize = 10;
const SAMPLES_PER_LAP: usize = 250;

fn sample_lap(lap_number: u32, t0: f64) -> LapRecord {
    let n = SAMPLES_PER_LAP;
    LapRecord {
        lap_number,
        lap_time_s: Some(90.0 + lap_number as f64 * 0.05),
        sector_times_s: [Some(28.0), Some(31.0), Some(31.0)],
        compound: Some(if lap_number <= 5 { "SOFT" } else { "HARD" }.to_string()),
        samples: SampleTable {
            t_s: (0..n).map(|i| t0 + i as f64 * 0.36).collect(),
            x: (0..n).map(|i| (i as f64 * 0.37).sin() * 4000.0).collect(),
            y: (0..n).map(|i| (i as f64 * 0.37).cos() * 2500.0).collect(),
            distance: (0..n).map(|i| i as f64 * 21.0).collect(),
            speed: (0..n).map(|i| 120.0 + (i % 160) as f64).collect(),
            gear: (0..n).map(|i| 2 + (i % 6) as i32).collect(),
            throttle: (0..n).map(|i| (i % 101) as f64).collect(),
            brake: vec![0.0; n],
            drs: vec![0; n],
        },
    }
}

fn sample_session() -> SessionData {
    let mut laps = BTreeMap::new();
    let mut colors = HashMap::new();
    for d in 0..DRIVERS {
        let code = format!("D{d:02}");
        colors.insert(code.clone(), format!("#{:06x}", d * 0x050505));
        laps.insert(
            code,
            (0..LAPS)
                .map(|l| sample_lap(l as u32 + 1, l as f64 * 90.0))
                .collect(),
        );
    }

    let weather_points = 120;
    SessionData {
        year: 2024,
        round: 1,
        kind: SessionKind::Race,
        rotation_deg: 25.0,
        colors,
        laps,
        weather: WeatherTable {
            t_s: (0..weather_points).map(|i| i as f64 * 10.0).collect(),
            track_temp: vec![40.0; weather_points],
            air_temp: vec![26.0; weather_points],
            humidity: vec![50.0; weather_points],
            wind_speed: vec![3.0; weather_points],
            rainfall: vec![false; weather_points],
        },
    }
}

fn bench_session_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_synthesis");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let data = sample_session();

    group.bench_function("build_session_25fps", |b| {
        b.iter(|| black_box(ReplaySession::build(data.clone(), 25).unwrap()));
    });

    group.bench_function("build_session_60fps", |b| {
        b.iter(|| black_box(ReplaySession::build(data.clone(), 60).unwrap()));
    });

    group.finish();
}

fn bench_frame_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_queries");

    let session = ReplaySession::build(sample_session(), 25).unwrap();
    let total = session.total_frames();

    group.bench_function("slice_100_frames", |b| {
        b.iter(|| black_box(session.frames(total / 2, total / 2 + 100)));
    });

    group.bench_function("tyre_strategy", |b| {
        b.iter(|| black_box(session.tyre_strategy()));
    });

    group.finish();
}

criterion_group!(benches, bench_session_build, bench_frame_queries);
criterion_main!(benches);
