// Derived replay state: the frame model shared by the synthesizer, the
// weather aligner, and the session handle.

pub(crate) mod lookup;
pub mod session;
pub mod synthesizer;
pub mod track;
pub mod weather;

use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};

pub use session::{LoadSummary, ReplaySession, SessionState};
pub use synthesizer::{DropReason, DroppedDriver};
pub use track::TrackGeometry;

/// Compound reported when a snapshot falls outside the recorded compound
/// sequence or the provider left the lap's compound blank.
pub const UNKNOWN_COMPOUND: &str = "UNKNOWN";

/// State of one car at one timeline step, positions in normalized render
/// coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    pub x: f64,
    pub y: f64,
    pub dist: f64,
    pub speed: f64,
    pub gear: i32,
    pub throttle: f64,
    pub brake: f64,
    pub drs: i32,
    pub lap: u32,
    pub tyre: String,
}

/// Weather conditions attached to a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub track_temp: f64,
    pub air_temp: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rainfall: bool,
}

/// One timestep of the replay. `t` is seconds since the first frame, rounded
/// to a millisecond; consecutive frames are exactly `1/fps` apart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    pub t: f64,
    pub drivers: BTreeMap<String, DriverSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

/// Team color of one driver, both as hex and as RGB components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverColor {
    pub hex: String,
    pub rgb: [u8; 3],
}

/// Parse the provider's hex color map into a render color table. Drivers
/// with unparsable colors are dropped from the table, not from the session.
pub(crate) fn build_color_table(colors: &HashMap<String, String>) -> HashMap<String, DriverColor> {
    let mut table = HashMap::new();
    for (driver, hex) in colors {
        match parse_hex_color(hex) {
            Some(rgb) => {
                let bare = hex.trim_start_matches('#');
                table.insert(
                    driver.clone(),
                    DriverColor {
                        hex: format!("#{bare}"),
                        rgb,
                    },
                );
            }
            None => warn!("dropping unparsable color {hex:?} for driver {driver}"),
        }
    }
    table
}

fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let bare = hex.trim_start_matches('#');
    // Length alone is not enough: slicing a multi-byte character would panic
    if bare.len() != 6 || !bare.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&bare[0..2], 16).ok()?;
    let g = u8::from_str_radix(&bare[2..4], 16).ok()?;
    let b = u8::from_str_radix(&bare[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Round to one decimal place, the precision of all snapshot floats.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to a millisecond, the precision of frame timestamps.
pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_parses_hex_with_and_without_hash() {
        let mut colors = HashMap::new();
        colors.insert("VER".to_string(), "#3671c6".to_string());
        colors.insert("NOR".to_string(), "ff8000".to_string());
        colors.insert("BAD".to_string(), "#12345".to_string());
        // 6 bytes but not 6 hex digits: must be dropped, not sliced mid-char
        colors.insert("ALB".to_string(), "aéaba".to_string());

        let table = build_color_table(&colors);
        assert_eq!(table.len(), 2);
        assert_eq!(table["VER"].rgb, [0x36, 0x71, 0xc6]);
        assert_eq!(table["NOR"].hex, "#ff8000");
        assert_eq!(table["NOR"].rgb, [0xff, 0x80, 0x00]);
        assert!(!table.contains_key("BAD"));
        assert!(!table.contains_key("ALB"));
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(12.35), 12.4);
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(0.04 * 3.0), 0.12);
    }

    #[test]
    fn test_frame_omits_missing_weather_in_json() {
        let frame = Frame {
            t: 0.0,
            drivers: BTreeMap::new(),
            weather: None,
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(!json.contains("weather"));
    }
}
