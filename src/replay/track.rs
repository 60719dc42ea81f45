// Track geometry derived from the fastest lap of a session. The normalized
// polyline and its scale/offsets are reused by the synthesizer so driver
// markers land on the rendered track.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::source::LapRecord;

/// Side length of the square rendering canvas.
pub const CANVAS_SIZE: u32 = 1000;
/// Extent the larger bounding-box dimension is mapped to.
const TRACK_EXTENT: f64 = 800.0;
/// Margin keeping the track clear of the canvas edge.
const TRACK_MARGIN: f64 = 100.0;

/// Normalized track boundary polyline plus the transform that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackGeometry {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub distance: Vec<f64>,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for TrackGeometry {
    /// Identity transform with an empty polyline; position normalization
    /// still works, markers just render in raw coordinates.
    fn default() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            distance: Vec::new(),
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl TrackGeometry {
    /// Map a raw position into canvas coordinates.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.offset_x) * self.scale + TRACK_MARGIN,
            (y - self.offset_y) * self.scale + TRACK_MARGIN,
        )
    }

    /// Build geometry from the fastest lap's samples and the circuit rotation
    /// in degrees. Degrades to [`TrackGeometry::default`] when the lap is
    /// missing, has no samples, or covers no area.
    pub fn from_fastest_lap(fastest: Option<&LapRecord>, rotation_deg: f64) -> Self {
        let Some(lap) = fastest else {
            warn!("no timed lap available, track geometry degrades to identity");
            return Self::default();
        };
        if lap.samples.is_empty() || !lap.samples.columns_consistent() {
            warn!(
                "fastest lap {} has unusable telemetry, track geometry degrades to identity",
                lap.lap_number
            );
            return Self::default();
        }

        let (x, y) = rotate(&lap.samples.x, &lap.samples.y, rotation_deg);

        let (x_min, x_max) = bounds(&x);
        let (y_min, y_max) = bounds(&y);
        let extent = (x_max - x_min).max(y_max - y_min);
        if extent <= 0.0 {
            warn!("fastest lap covers no area, track geometry degrades to identity");
            return Self::default();
        }
        let scale = TRACK_EXTENT / extent;

        Self {
            x: x.iter().map(|v| (v - x_min) * scale + TRACK_MARGIN).collect(),
            y: y.iter().map(|v| (v - y_min) * scale + TRACK_MARGIN).collect(),
            distance: lap.samples.distance.clone(),
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            scale,
            offset_x: x_min,
            offset_y: y_min,
        }
    }
}

fn rotate(x: &[f64], y: &[f64], rotation_deg: f64) -> (Vec<f64>, Vec<f64>) {
    if rotation_deg == 0.0 {
        return (x.to_vec(), y.to_vec());
    }
    let rad = rotation_deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    let x_rot = x.iter().zip(y).map(|(xi, yi)| xi * cos - yi * sin).collect();
    let y_rot = x.iter().zip(y).map(|(xi, yi)| xi * sin + yi * cos).collect();
    (x_rot, y_rot)
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::MAX, f64::MIN), |(min, max), &v| {
        (min.min(v), max.max(v))
    })
}
