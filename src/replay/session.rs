// Session lifecycle: build a complete, immutable replay session off to the
// side and swap it in atomically. Readers always see either the previous or
// the new fully-built session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::ReplayConfig;
use crate::source::{SessionData, SessionKind, TelemetrySource};
use crate::{PitwallError, analysis};

use super::synthesizer::{self, DroppedDriver};
use super::track::TrackGeometry;
use super::weather::align_weather;
use super::{DriverColor, Frame, build_color_table};

/// What a completed load reports back to the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadSummary {
    pub total_frames: usize,
    pub drivers: Vec<String>,
    pub driver_colors: HashMap<String, DriverColor>,
    pub track: TrackGeometry,
    pub total_laps: u32,
}

/// One fully-processed session: the frame sequence, derived render state, and
/// the source tables the analysis views aggregate over. Immutable once built.
pub struct ReplaySession {
    pub(crate) data: SessionData,
    frames: Vec<Frame>,
    drivers: Vec<String>,
    dropped: Vec<DroppedDriver>,
    colors: HashMap<String, DriverColor>,
    track: TrackGeometry,
}

impl ReplaySession {
    /// Run the full pipeline over raw session tables. Fails only when not a
    /// single frame can be synthesized; per-driver, geometry, and weather
    /// problems degrade locally.
    pub fn build(data: SessionData, fps: u32) -> Result<Self, PitwallError> {
        let colors = build_color_table(&data.colors);
        let track = TrackGeometry::from_fastest_lap(data.fastest_lap(), data.rotation_deg);

        let mut timeline = synthesizer::synthesize(&data, &track, fps);
        if timeline.frames.is_empty() {
            return Err(PitwallError::EmptySession);
        }
        align_weather(&mut timeline.frames, &data.weather, timeline.t_offset);

        info!(
            "session {}-{}-{} ready: {} frames, {} drivers",
            data.year,
            data.round,
            data.kind,
            timeline.frames.len(),
            timeline.drivers.len()
        );

        Ok(Self {
            data,
            frames: timeline.frames,
            drivers: timeline.drivers,
            dropped: timeline.dropped,
            colors,
            track,
        })
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            total_frames: self.frames.len(),
            drivers: self.drivers.clone(),
            driver_colors: self.colors.clone(),
            track: self.track.clone(),
            total_laps: self.data.total_laps(),
        }
    }

    /// The half-open frame slice `[start, end)`, clamped to the sequence.
    pub fn frames(&self, start: usize, end: usize) -> &[Frame] {
        let len = self.frames.len();
        let start = start.min(len);
        let end = end.clamp(start, len);
        &self.frames[start..end]
    }

    /// A single frame, None outside `[0, total_frames)`.
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Drivers present in every frame, in code order.
    pub fn drivers(&self) -> &[String] {
        &self.drivers
    }

    /// Drivers excluded from the timeline, with reasons.
    pub fn dropped_drivers(&self) -> &[DroppedDriver] {
        &self.dropped
    }

    pub fn driver_colors(&self) -> &HashMap<String, DriverColor> {
        &self.colors
    }

    pub fn track(&self) -> &TrackGeometry {
        &self.track
    }

    pub(crate) fn driver_color_hex(&self, code: &str) -> String {
        self.colors
            .get(code)
            .map(|c| c.hex.clone())
            .unwrap_or_else(|| "#ffffff".to_string())
    }
}

/// Holds the single active session. Loads are serialized through a
/// non-blocking gate; queries see complete sessions only.
pub struct SessionState<S: TelemetrySource> {
    source: S,
    config: ReplayConfig,
    current: RwLock<Option<Arc<ReplaySession>>>,
    load_gate: Mutex<()>,
}

impl<S: TelemetrySource> SessionState<S> {
    pub fn new(source: S, config: ReplayConfig) -> Self {
        Self {
            source,
            config,
            current: RwLock::new(None),
            load_gate: Mutex::new(()),
        }
    }

    /// Load and process a session, replacing the previous one. A load
    /// already in flight surfaces as [`PitwallError::LoadInProgress`]; a
    /// failed load leaves the previous session untouched.
    pub fn load(
        &self,
        year: u16,
        round: u32,
        kind: SessionKind,
    ) -> Result<LoadSummary, PitwallError> {
        let _gate = self
            .load_gate
            .try_lock()
            .map_err(|_| PitwallError::LoadInProgress)?;

        let data = self.source.load_session(year, round, kind)?;
        let session = Arc::new(ReplaySession::build(data, self.config.fps)?);
        let summary = session.summary();

        *self.current.write().expect("session lock poisoned") = Some(session);
        Ok(summary)
    }

    /// Handle to the currently loaded session.
    pub fn session(&self) -> Result<Arc<ReplaySession>, PitwallError> {
        self.current
            .read()
            .expect("session lock poisoned")
            .clone()
            .ok_or(PitwallError::NoActiveSession)
    }

    pub fn schedule(&self, year: u16) -> Result<Vec<crate::source::EventInfo>, PitwallError> {
        self.source.list_events(year)
    }

    pub fn frames(&self, start: usize, end: usize) -> Result<Vec<Frame>, PitwallError> {
        Ok(self.session()?.frames(start, end).to_vec())
    }

    pub fn frame(&self, index: usize) -> Result<Option<Frame>, PitwallError> {
        Ok(self.session()?.frame(index).cloned())
    }

    pub fn driver_telemetry(
        &self,
        code: &str,
        lap: Option<u32>,
    ) -> Result<analysis::DriverLapTelemetry, PitwallError> {
        self.session()?.driver_telemetry(code, lap)
    }

    pub fn lap_time_analysis(
        &self,
    ) -> Result<HashMap<String, analysis::DriverLapTimes>, PitwallError> {
        Ok(self.session()?.lap_time_analysis())
    }

    pub fn tyre_strategy(&self) -> Result<Vec<analysis::DriverStrategy>, PitwallError> {
        Ok(self.session()?.tyre_strategy())
    }

    pub fn sector_analysis(
        &self,
        code: &str,
    ) -> Result<analysis::SectorBreakdown, PitwallError> {
        self.session()?.sector_analysis(code)
    }

    pub fn weather_series(&self) -> Result<Option<analysis::WeatherSeries>, PitwallError> {
        Ok(self.session()?.weather_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EventInfo, LapRecord, SampleTable, WeatherTable};
    use std::collections::BTreeMap;

    fn lap(lap_number: u32, t0: f64, n: usize) -> LapRecord {
        LapRecord {
            lap_number,
            lap_time_s: Some(90.0),
            sector_times_s: [Some(30.0), Some(30.0), Some(30.0)],
            compound: Some("MEDIUM".to_string()),
            samples: SampleTable {
                t_s: (0..n).map(|i| t0 + i as f64 * 0.1).collect(),
                x: (0..n).map(|i| i as f64).collect(),
                y: (0..n).map(|i| i as f64).collect(),
                distance: (0..n).map(|i| i as f64 * 10.0).collect(),
                speed: vec![200.0; n],
                gear: vec![6; n],
                throttle: vec![100.0; n],
                brake: vec![0.0; n],
                drs: vec![0; n],
            },
        }
    }

    fn session_data(n_samples: usize) -> SessionData {
        let mut laps = BTreeMap::new();
        laps.insert("VER".to_string(), vec![lap(1, 0.0, n_samples)]);
        let mut colors = HashMap::new();
        colors.insert("VER".to_string(), "#3671c6".to_string());
        SessionData {
            year: 2024,
            round: 1,
            kind: SessionKind::Race,
            rotation_deg: 0.0,
            colors,
            laps,
            weather: WeatherTable::default(),
        }
    }

    struct FixtureSource {
        data: SessionData,
        fail: std::cell::Cell<bool>,
    }

    impl FixtureSource {
        fn new(data: SessionData) -> Self {
            Self {
                data,
                fail: std::cell::Cell::new(false),
            }
        }
    }

    impl TelemetrySource for FixtureSource {
        fn list_events(&self, _year: u16) -> Result<Vec<EventInfo>, PitwallError> {
            Ok(Vec::new())
        }

        fn load_session(
            &self,
            _year: u16,
            _round: u32,
            _kind: SessionKind,
        ) -> Result<SessionData, PitwallError> {
            if self.fail.get() {
                return Err(PitwallError::SessionFileIO {
                    path: "missing".to_string(),
                    source: std::io::Error::other("unreachable"),
                });
            }
            Ok(self.data.clone())
        }
    }

    fn state_with(data: SessionData) -> SessionState<FixtureSource> {
        SessionState::new(FixtureSource::new(data), ReplayConfig::default())
    }

    #[test]
    fn test_queries_before_load_report_no_active_session() {
        let state = state_with(session_data(20));
        assert!(matches!(
            state.frames(0, 10),
            Err(PitwallError::NoActiveSession)
        ));
        assert!(matches!(
            state.tyre_strategy(),
            Err(PitwallError::NoActiveSession)
        ));
    }

    #[test]
    fn test_load_installs_session_and_reports_summary() {
        let state = state_with(session_data(20));
        let summary = state.load(2024, 1, SessionKind::Race).unwrap();

        // Samples at 0.0..=1.9 s, dt = 0.04 -> 48 frames
        assert_eq!(summary.total_frames, 48);
        assert_eq!(summary.drivers, vec!["VER".to_string()]);
        assert_eq!(summary.total_laps, 1);
        assert_eq!(summary.driver_colors["VER"].rgb, [0x36, 0x71, 0xc6]);

        let session = state.session().unwrap();
        assert_eq!(session.total_frames(), 48);
    }

    #[test]
    fn test_frame_range_is_clamped_not_an_error() {
        let state = state_with(session_data(20));
        state.load(2024, 1, SessionKind::Race).unwrap();

        assert_eq!(state.frames(0, 10).unwrap().len(), 10);
        assert_eq!(state.frames(40, 500).unwrap().len(), 8);
        assert!(state.frames(48, 50).unwrap().is_empty());
        assert!(state.frames(500, 510).unwrap().is_empty());
        // Inverted ranges collapse to empty
        assert!(state.frames(10, 5).unwrap().is_empty());
    }

    #[test]
    fn test_single_frame_lookup_is_optional() {
        let state = state_with(session_data(20));
        state.load(2024, 1, SessionKind::Race).unwrap();

        assert!(state.frame(0).unwrap().is_some());
        assert!(state.frame(47).unwrap().is_some());
        assert!(state.frame(48).unwrap().is_none());
    }

    #[test]
    fn test_failed_load_keeps_previous_session() {
        let state = state_with(session_data(20));
        state.load(2024, 1, SessionKind::Race).unwrap();

        state.source.fail.set(true);
        assert!(matches!(
            state.load(2024, 1, SessionKind::Race),
            Err(PitwallError::SessionFileIO { .. })
        ));
        assert_eq!(state.session().unwrap().total_frames(), 48);
    }

    #[test]
    fn test_session_without_any_telemetry_aborts_load() {
        let state = state_with(session_data(0));
        assert!(matches!(
            state.load(2024, 1, SessionKind::Race),
            Err(PitwallError::EmptySession)
        ));
        assert!(matches!(
            state.session(),
            Err(PitwallError::NoActiveSession)
        ));
    }

    #[test]
    fn test_concurrent_load_is_rejected_as_busy() {
        let state = state_with(session_data(20));
        // Hold the gate the way an in-flight load would
        let _gate = state.load_gate.lock().unwrap();
        assert!(matches!(
            state.load(2024, 1, SessionKind::Race),
            Err(PitwallError::LoadInProgress)
        ));
    }
}
