// Timeline synthesis: resample every driver's irregular telemetry onto one
// uniform global timeline. Each frame holds the nearest-past sample of every
// driver, position-normalized against the track geometry.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::source::SessionData;

use super::lookup::TimeCursor;
use super::track::TrackGeometry;
use super::{DriverSnapshot, Frame, UNKNOWN_COMPOUND, round1, round3};

/// Why a driver is absent from the synthesized timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DropReason {
    /// The driver has laps but not a single telemetry sample.
    NoTelemetry,
    /// A lap's sample table had mismatched column lengths.
    Malformed { reason: String },
}

/// A driver excluded from synthesis, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DroppedDriver {
    pub code: String,
    pub reason: DropReason,
}

/// Uniform frame sequence plus the drivers that did not make it in.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    pub frames: Vec<Frame>,
    /// Driver codes present in every frame, in code order.
    pub drivers: Vec<String>,
    pub dropped: Vec<DroppedDriver>,
    /// Session time of frame 0; frame timestamps are re-based against it.
    pub t_offset: f64,
}

/// One driver's laps concatenated into a single time-ordered sample stream.
/// `lap` and `tyre` are replicated per sample from the owning lap record.
struct DriverStream {
    code: String,
    t: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    dist: Vec<f64>,
    speed: Vec<f64>,
    gear: Vec<i32>,
    throttle: Vec<f64>,
    brake: Vec<f64>,
    drs: Vec<i32>,
    lap: Vec<u32>,
    tyre: Vec<String>,
}

fn build_stream(code: &str, laps: &[crate::source::LapRecord]) -> Result<DriverStream, String> {
    let mut stream = DriverStream {
        code: code.to_string(),
        t: Vec::new(),
        x: Vec::new(),
        y: Vec::new(),
        dist: Vec::new(),
        speed: Vec::new(),
        gear: Vec::new(),
        throttle: Vec::new(),
        brake: Vec::new(),
        drs: Vec::new(),
        lap: Vec::new(),
        tyre: Vec::new(),
    };

    for lap in laps {
        let samples = &lap.samples;
        if samples.is_empty() {
            continue;
        }
        if !samples.columns_consistent() {
            return Err(format!("lap {} has mismatched sample columns", lap.lap_number));
        }
        let compound = lap
            .compound
            .clone()
            .unwrap_or_else(|| UNKNOWN_COMPOUND.to_string());

        stream.t.extend_from_slice(&samples.t_s);
        stream.x.extend_from_slice(&samples.x);
        stream.y.extend_from_slice(&samples.y);
        stream.dist.extend_from_slice(&samples.distance);
        stream.speed.extend_from_slice(&samples.speed);
        stream.gear.extend_from_slice(&samples.gear);
        stream.throttle.extend_from_slice(&samples.throttle);
        stream.brake.extend_from_slice(&samples.brake);
        stream.drs.extend_from_slice(&samples.drs);
        stream
            .lap
            .extend(std::iter::repeat_n(lap.lap_number, samples.len()));
        stream
            .tyre
            .extend(std::iter::repeat_n(compound, samples.len()));
    }

    Ok(stream)
}

/// Synthesize the uniform frame sequence for a session. One bad driver does
/// not fail the session; it is reported in the returned timeline instead.
/// A session with no telemetry at all yields an empty timeline.
pub fn synthesize(data: &SessionData, geometry: &TrackGeometry, fps: u32) -> Timeline {
    let mut streams = Vec::new();
    let mut dropped = Vec::new();

    for (code, laps) in &data.laps {
        match build_stream(code, laps) {
            Ok(stream) if stream.t.is_empty() => {
                // Not an error, the driver just never produced samples
                dropped.push(DroppedDriver {
                    code: code.clone(),
                    reason: DropReason::NoTelemetry,
                });
            }
            Ok(stream) => streams.push(stream),
            Err(reason) => {
                warn!("excluding driver {code} from replay: {reason}");
                dropped.push(DroppedDriver {
                    code: code.clone(),
                    reason: DropReason::Malformed { reason },
                });
            }
        }
    }

    if streams.is_empty() {
        return Timeline {
            frames: Vec::new(),
            drivers: Vec::new(),
            dropped,
            t_offset: 0.0,
        };
    }

    let global_t_min = streams
        .iter()
        .map(|s| s.t[0])
        .fold(f64::MAX, f64::min);
    let global_t_max = streams
        .iter()
        .map(|s| *s.t.last().unwrap())
        .fold(f64::MIN, f64::max);

    let dt = 1.0 / fps as f64;
    let mut cursors: Vec<TimeCursor<'_>> = streams.iter().map(|s| TimeCursor::new(&s.t)).collect();

    let mut frames = Vec::new();
    let mut k: u64 = 0;
    loop {
        let t_k = global_t_min + k as f64 * dt;
        if t_k >= global_t_max {
            break;
        }

        let mut drivers = BTreeMap::new();
        for (stream, cursor) in streams.iter().zip(cursors.iter_mut()) {
            let idx = cursor.advance_to(t_k);
            let (x_norm, y_norm) = geometry.normalize(stream.x[idx], stream.y[idx]);
            drivers.insert(
                stream.code.clone(),
                DriverSnapshot {
                    x: round1(x_norm),
                    y: round1(y_norm),
                    dist: round1(stream.dist[idx]),
                    speed: round1(stream.speed[idx]),
                    gear: stream.gear[idx],
                    throttle: round1(stream.throttle[idx]),
                    brake: round1(stream.brake[idx]),
                    drs: stream.drs[idx],
                    lap: stream.lap[idx],
                    tyre: stream
                        .tyre
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_COMPOUND.to_string()),
                },
            );
        }

        frames.push(Frame {
            t: round3(t_k - global_t_min),
            drivers,
            weather: None,
        });
        k += 1;
    }

    let mut drivers: Vec<String> = streams.into_iter().map(|s| s.code).collect();
    drivers.sort();

    info!(
        "synthesized {} frames at {fps} fps for {} drivers ({} dropped)",
        frames.len(),
        drivers.len(),
        dropped.len()
    );

    Timeline {
        frames,
        drivers,
        dropped,
        t_offset: global_t_min,
    }
}
