use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::PitwallError;

const CONFIG_FILE_NAME: &str = "config.json";

/// Frames per second of the synthesized replay timeline.
pub const DEFAULT_FPS: u32 = 25;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReplayConfig {
    pub fps: u32,
    /// Directory holding schedule and session recordings.
    pub data_dir: PathBuf,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            data_dir: PathBuf::from("recordings"),
        }
    }
}

impl ReplayConfig {
    /// Seconds between consecutive frames.
    pub fn dt(&self) -> f64 {
        1.0 / self.fps as f64
    }

    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("pitwall").join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            serde_json::from_reader(file).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), PitwallError> {
        let config_path = dirs::config_dir()
            .ok_or(PitwallError::NoConfigDir)?
            .join("pitwall")
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            std::fs::create_dir_all(config_path.parent().unwrap())
                .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }
}
