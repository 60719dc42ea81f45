// Tabular session data as delivered by a telemetry source. Everything in this
// module is raw provider output; derived replay state lives in `replay`.

pub mod recorded;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PitwallError;

pub use recorded::RecordedSource;

/// One timed activity of a race weekend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Race,
    Qualifying,
    Sprint,
}

impl SessionKind {
    /// Single-letter code used in recording file names and the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            SessionKind::Race => "R",
            SessionKind::Qualifying => "Q",
            SessionKind::Sprint => "S",
        }
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" | "r" | "race" | "Race" => Ok(SessionKind::Race),
            "Q" | "q" | "qualifying" | "Qualifying" => Ok(SessionKind::Qualifying),
            "S" | "s" | "sprint" | "Sprint" => Ok(SessionKind::Sprint),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One entry of a season schedule. Test events are filtered out at recording
/// time and never appear here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventInfo {
    pub round: u32,
    pub name: String,
    pub country: String,
    pub date: String,
    pub has_sprint: bool,
}

/// Column-major telemetry samples for a single lap. All columns have the same
/// length; `t_s` is seconds since session start and non-decreasing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SampleTable {
    pub t_s: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub distance: Vec<f64>,
    pub speed: Vec<f64>,
    pub gear: Vec<i32>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    pub drs: Vec<i32>,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.t_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }

    /// Every column must match the timestamp column. Recordings assembled from
    /// malformed provider rows can violate this.
    pub fn columns_consistent(&self) -> bool {
        let n = self.t_s.len();
        self.x.len() == n
            && self.y.len() == n
            && self.distance.len() == n
            && self.speed.len() == n
            && self.gear.len() == n
            && self.throttle.len() == n
            && self.brake.len() == n
            && self.drs.len() == n
    }
}

/// One lap of one driver: timing summary plus its telemetry sample table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap_number: u32,
    /// None for laps without a recorded time (e.g. red-flagged laps).
    pub lap_time_s: Option<f64>,
    /// Sector 1/2/3 times; individually missing on incomplete laps.
    pub sector_times_s: [Option<f64>; 3],
    /// None when the provider did not report a compound for the lap.
    pub compound: Option<String>,
    pub samples: SampleTable,
}

/// Session-wide weather samples, column-major like [`SampleTable`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WeatherTable {
    pub t_s: Vec<f64>,
    pub track_temp: Vec<f64>,
    pub air_temp: Vec<f64>,
    pub humidity: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub rainfall: Vec<bool>,
}

impl WeatherTable {
    pub fn is_empty(&self) -> bool {
        self.t_s.is_empty()
    }
}

/// Everything a telemetry source delivers for one session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub year: u16,
    pub round: u32,
    pub kind: SessionKind,
    /// Circuit rotation in degrees applied before rendering; 0 when unknown.
    pub rotation_deg: f64,
    /// Driver code to team hex color (e.g. "#3671c6").
    pub colors: HashMap<String, String>,
    /// Laps per driver code, each driver's laps in chronological order.
    pub laps: BTreeMap<String, Vec<LapRecord>>,
    pub weather: WeatherTable,
}

impl SessionData {
    pub fn driver_laps(&self, code: &str) -> Result<&[LapRecord], PitwallError> {
        self.laps
            .get(code)
            .map(Vec::as_slice)
            .ok_or(PitwallError::UnknownDriver {
                code: code.to_string(),
            })
    }

    /// Highest lap number recorded by any driver.
    pub fn total_laps(&self) -> u32 {
        self.laps
            .values()
            .flatten()
            .map(|lap| lap.lap_number)
            .max()
            .unwrap_or(0)
    }

    /// The lap with the lowest recorded time across all drivers.
    pub fn fastest_lap(&self) -> Option<&LapRecord> {
        self.laps
            .values()
            .flatten()
            .filter(|lap| lap.lap_time_s.is_some())
            .min_by(|a, b| {
                a.lap_time_s
                    .partial_cmp(&b.lap_time_s)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

/// External provider of session schedules and telemetry tables. Implemented
/// by [`RecordedSource`] for JSONL recordings and by in-memory fixtures in
/// tests.
pub trait TelemetrySource {
    /// All events of a season, in round order, test events excluded.
    fn list_events(&self, year: u16) -> Result<Vec<EventInfo>, PitwallError>;

    /// Full telemetry tables for one session. Expected to be slow for real
    /// recordings; callers must not assume sub-second latency.
    fn load_session(
        &self,
        year: u16,
        round: u32,
        kind: SessionKind,
    ) -> Result<SessionData, PitwallError>;
}
