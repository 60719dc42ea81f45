// Read-only aggregations over the loaded session's source tables. These
// views work on lap records and the weather table directly, independent of
// the synthesized frame timeline.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::replay::{ReplaySession, UNKNOWN_COMPOUND};
use crate::source::LapRecord;
use crate::PitwallError;

/// Lap time profile of one driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverLapTimes {
    pub lap_numbers: Vec<u32>,
    pub lap_times_s: Vec<f64>,
    /// None when the driver has no timed laps.
    pub fastest_s: Option<f64>,
    pub average_s: Option<f64>,
}

/// A maximal run of consecutive laps on the same compound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub compound: String,
    pub start_lap: u32,
    pub end_lap: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverStrategy {
    pub driver: String,
    pub color: String,
    pub stints: Vec<Stint>,
}

/// Per-lap sector splits for one driver. Laps without a sector-1 time are
/// skipped entirely; sectors 2 and 3 are individually nullable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectorBreakdown {
    pub lap_numbers: Vec<u32>,
    pub sector1_s: Vec<f64>,
    pub sector2_s: Vec<Option<f64>>,
    pub sector3_s: Vec<Option<f64>>,
}

/// Session weather time series, keyed by minutes since session start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeatherSeries {
    pub time_min: Vec<f64>,
    pub track_temp: Vec<f64>,
    pub air_temp: Vec<f64>,
    pub humidity: Vec<f64>,
    pub wind_speed: Vec<f64>,
}

/// Detailed telemetry columns for a single lap of a single driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverLapTelemetry {
    pub distance: Vec<f64>,
    pub speed: Vec<f64>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    pub gear: Vec<i32>,
    pub drs: Vec<i32>,
    pub lap_time_s: Option<f64>,
    pub compound: String,
}

fn compound_of(lap: &LapRecord) -> String {
    lap.compound
        .clone()
        .unwrap_or_else(|| UNKNOWN_COMPOUND.to_string())
}

fn sorted_by_lap(laps: &[LapRecord]) -> Vec<&LapRecord> {
    let mut sorted: Vec<&LapRecord> = laps.iter().collect();
    sorted.sort_by_key(|lap| lap.lap_number);
    sorted
}

/// Stints of one driver: a new stint starts whenever the compound differs
/// from the previous lap's, and the final stint runs to the last lap.
fn stints(laps: &[LapRecord]) -> Vec<Stint> {
    let sorted = sorted_by_lap(laps);
    let Some(last) = sorted.last() else {
        return Vec::new();
    };
    let max_lap = last.lap_number;

    let grouped = sorted.iter().chunk_by(|lap| compound_of(lap));
    let starts: Vec<(String, u32)> = grouped
        .into_iter()
        .map(|(compound, mut group)| (compound, group.next().unwrap().lap_number))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (compound, start_lap))| Stint {
            compound: compound.clone(),
            start_lap: *start_lap,
            // A stint ends where the next one begins
            end_lap: starts
                .get(i + 1)
                .map(|(_, next_start)| next_start - 1)
                .unwrap_or(max_lap),
        })
        .collect()
}

impl ReplaySession {
    /// Lap times per driver, fastest and average included. Drivers with no
    /// timed laps report None for both.
    pub fn lap_time_analysis(&self) -> HashMap<String, DriverLapTimes> {
        self.data
            .laps
            .iter()
            .map(|(driver, laps)| {
                let timed: Vec<(&LapRecord, f64)> = sorted_by_lap(laps)
                    .into_iter()
                    .filter_map(|lap| lap.lap_time_s.map(|t| (lap, t)))
                    .collect();
                let lap_times_s: Vec<f64> = timed.iter().map(|(_, t)| *t).collect();
                let fastest_s = lap_times_s.iter().cloned().reduce(f64::min);
                let average_s = (!lap_times_s.is_empty())
                    .then(|| lap_times_s.iter().sum::<f64>() / lap_times_s.len() as f64);
                (
                    driver.clone(),
                    DriverLapTimes {
                        lap_numbers: timed.iter().map(|(lap, _)| lap.lap_number).collect(),
                        lap_times_s,
                        fastest_s,
                        average_s,
                    },
                )
            })
            .collect()
    }

    /// Tyre stints per driver, with the driver's render color.
    pub fn tyre_strategy(&self) -> Vec<DriverStrategy> {
        self.data
            .laps
            .iter()
            .map(|(driver, laps)| DriverStrategy {
                driver: driver.clone(),
                color: self.driver_color_hex(driver),
                stints: stints(laps),
            })
            .collect()
    }

    /// Sector splits for one driver.
    pub fn sector_analysis(&self, code: &str) -> Result<SectorBreakdown, PitwallError> {
        let laps = self.data.driver_laps(code)?;
        let mut breakdown = SectorBreakdown {
            lap_numbers: Vec::new(),
            sector1_s: Vec::new(),
            sector2_s: Vec::new(),
            sector3_s: Vec::new(),
        };
        for lap in sorted_by_lap(laps) {
            let Some(s1) = lap.sector_times_s[0] else {
                continue;
            };
            breakdown.lap_numbers.push(lap.lap_number);
            breakdown.sector1_s.push(s1);
            breakdown.sector2_s.push(lap.sector_times_s[1]);
            breakdown.sector3_s.push(lap.sector_times_s[2]);
        }
        Ok(breakdown)
    }

    /// Weather over the whole session, None when nothing was recorded.
    pub fn weather_series(&self) -> Option<WeatherSeries> {
        let weather = &self.data.weather;
        if weather.is_empty() {
            return None;
        }
        Some(WeatherSeries {
            time_min: weather.t_s.iter().map(|t| t / 60.0).collect(),
            track_temp: weather.track_temp.clone(),
            air_temp: weather.air_temp.clone(),
            humidity: weather.humidity.clone(),
            wind_speed: weather.wind_speed.clone(),
        })
    }

    /// Telemetry columns for one lap of one driver, the fastest timed lap
    /// when `lap` is None.
    pub fn driver_telemetry(
        &self,
        code: &str,
        lap: Option<u32>,
    ) -> Result<DriverLapTelemetry, PitwallError> {
        let laps = self.data.driver_laps(code)?;
        let record = match lap {
            Some(number) => laps
                .iter()
                .find(|l| l.lap_number == number)
                .ok_or(PitwallError::UnknownLap {
                    code: code.to_string(),
                    lap: number,
                })?,
            None => laps
                .iter()
                .filter(|l| l.lap_time_s.is_some())
                .min_by(|a, b| {
                    a.lap_time_s
                        .partial_cmp(&b.lap_time_s)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .ok_or(PitwallError::NoTimedLaps {
                    code: code.to_string(),
                })?,
        };

        Ok(DriverLapTelemetry {
            distance: record.samples.distance.clone(),
            speed: record.samples.speed.clone(),
            throttle: record.samples.throttle.clone(),
            brake: record.samples.brake.clone(),
            gear: record.samples.gear.clone(),
            drs: record.samples.drs.clone(),
            lap_time_s: record.lap_time_s,
            compound: compound_of(record),
        })
    }
}
