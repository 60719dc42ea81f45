// Weather alignment: attach the nearest-past weather sample to every frame.

use log::info;

use crate::source::WeatherTable;

use super::lookup::nearest_past;
use super::{Frame, WeatherSnapshot, round1};

/// Attach weather snapshots to a synthesized frame sequence. `t_offset` is
/// the session time of frame 0 (frames carry re-based timestamps). An empty
/// weather table leaves the frames untouched.
pub fn align_weather(frames: &mut [Frame], weather: &WeatherTable, t_offset: f64) {
    if weather.is_empty() {
        info!("no weather data recorded, frames carry no weather");
        return;
    }

    for frame in frames.iter_mut() {
        let idx = nearest_past(&weather.t_s, t_offset + frame.t);
        frame.weather = Some(WeatherSnapshot {
            track_temp: round1(weather.track_temp[idx]),
            air_temp: round1(weather.air_temp[idx]),
            humidity: round1(weather.humidity[idx]),
            wind_speed: round1(weather.wind_speed[idx]),
            rainfall: weather.rainfall[idx],
        });
    }
}
