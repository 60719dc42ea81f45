// JSONL-backed telemetry source. One file per season schedule and one file
// per recorded session, readable with serde-jsonlines.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use serde_jsonlines::json_lines;

use crate::PitwallError;

use super::{EventInfo, LapRecord, SessionData, SessionKind, TelemetrySource, WeatherTable};

/// First line of every session recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionHeader {
    pub year: u16,
    pub round: u32,
    pub kind: SessionKind,
    pub rotation_deg: f64,
    pub colors: std::collections::HashMap<String, String>,
}

/// One line of a session recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SessionLine {
    Header(SessionHeader),
    Lap { driver: String, lap: LapRecord },
    Weather(WeatherRow),
}

/// A single weather sample as recorded, turned back into the column-major
/// [`WeatherTable`] on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeatherRow {
    pub t_s: f64,
    pub track_temp: f64,
    pub air_temp: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rainfall: bool,
}

/// Telemetry source reading session recordings from a directory:
/// `schedule-<year>.jsonl` and `session-<year>-<round>-<code>.jsonl`.
pub struct RecordedSource {
    data_dir: PathBuf,
}

impl RecordedSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn schedule_path(&self, year: u16) -> PathBuf {
        self.data_dir.join(format!("schedule-{year}.jsonl"))
    }

    fn session_path(&self, year: u16, round: u32, kind: SessionKind) -> PathBuf {
        self.data_dir
            .join(format!("session-{year}-{round}-{}.jsonl", kind.code()))
    }

    /// Write a schedule recording; used by the recorder utility and tests.
    pub fn write_schedule(&self, year: u16, events: &[EventInfo]) -> Result<(), PitwallError> {
        write_jsonl(&self.schedule_path(year), events.iter())
            .map_err(|e| PitwallError::ScheduleFileIO { year, source: e })
    }

    /// Write a full session recording in the line layout `load_session`
    /// expects: header first, then lap and weather lines.
    pub fn write_session(&self, data: &SessionData) -> Result<(), PitwallError> {
        let path = self.session_path(data.year, data.round, data.kind);
        let header = SessionLine::Header(SessionHeader {
            year: data.year,
            round: data.round,
            kind: data.kind,
            rotation_deg: data.rotation_deg,
            colors: data.colors.clone(),
        });
        let laps = data.laps.iter().flat_map(|(driver, laps)| {
            laps.iter().map(|lap| SessionLine::Lap {
                driver: driver.clone(),
                lap: lap.clone(),
            })
        });
        let weather = (0..data.weather.t_s.len()).map(|i| {
            SessionLine::Weather(WeatherRow {
                t_s: data.weather.t_s[i],
                track_temp: data.weather.track_temp[i],
                air_temp: data.weather.air_temp[i],
                humidity: data.weather.humidity[i],
                wind_speed: data.weather.wind_speed[i],
                rainfall: data.weather.rainfall[i],
            })
        });

        let lines = std::iter::once(header).chain(laps).chain(weather);
        write_jsonl(&path, lines).map_err(|e| PitwallError::SessionFileIO {
            path: path.display().to_string(),
            source: e,
        })
    }
}

fn write_jsonl<T: Serialize>(
    path: &Path,
    items: impl Iterator<Item = T>,
) -> Result<(), std::io::Error> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for item in items {
        writeln!(writer, "{}", serde_json::to_string(&item)?)?;
    }
    writer.flush()
}

impl TelemetrySource for RecordedSource {
    fn list_events(&self, year: u16) -> Result<Vec<EventInfo>, PitwallError> {
        let path = self.schedule_path(year);
        let events = json_lines(&path)
            .map_err(|e| PitwallError::ScheduleFileIO { year, source: e })?
            .collect::<Result<Vec<EventInfo>, std::io::Error>>()
            .map_err(|e| PitwallError::ScheduleFileIO { year, source: e })?;
        Ok(events)
    }

    fn load_session(
        &self,
        year: u16,
        round: u32,
        kind: SessionKind,
    ) -> Result<SessionData, PitwallError> {
        let path = self.session_path(year, round, kind);
        let path_str = path.display().to_string();
        let lines = json_lines(&path)
            .map_err(|e| PitwallError::SessionFileIO {
                path: path_str.clone(),
                source: e,
            })?
            .collect::<Result<Vec<SessionLine>, std::io::Error>>()
            .map_err(|e| PitwallError::SessionFileIO {
                path: path_str.clone(),
                source: e,
            })?;

        let mut lines = lines.into_iter();
        let header = match lines.next() {
            Some(SessionLine::Header(header)) => header,
            _ => return Err(PitwallError::MissingSessionHeader { path: path_str }),
        };

        let mut laps: BTreeMap<String, Vec<LapRecord>> = BTreeMap::new();
        let mut weather = WeatherTable::default();
        for line in lines {
            match line {
                SessionLine::Lap { driver, lap } => {
                    laps.entry(driver).or_default().push(lap);
                }
                SessionLine::Weather(row) => {
                    weather.t_s.push(row.t_s);
                    weather.track_temp.push(row.track_temp);
                    weather.air_temp.push(row.air_temp);
                    weather.humidity.push(row.humidity);
                    weather.wind_speed.push(row.wind_speed);
                    weather.rainfall.push(row.rainfall);
                }
                // A stray second header ends up here; keep the first one
                SessionLine::Header(_) => {}
            }
        }
        // Lap lines may arrive in any order
        for driver_laps in laps.values_mut() {
            driver_laps.sort_by_key(|lap| lap.lap_number);
        }

        info!(
            "loaded recording {}: {} drivers, {} weather samples",
            path.display(),
            laps.len(),
            weather.t_s.len()
        );

        Ok(SessionData {
            year: header.year,
            round: header.round,
            kind: header.kind,
            rotation_deg: header.rotation_deg,
            colors: header.colors,
            laps,
            weather,
        })
    }
}
