// Error types for pitwall

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PitwallError {
    // Errors for the recorded telemetry source
    #[snafu(display("Unable to read schedule recording for {year}"))]
    ScheduleFileIO { year: u16, source: io::Error },
    #[snafu(display("Unable to read session recording {path}"))]
    SessionFileIO { path: String, source: io::Error },
    #[snafu(display("Session recording {path} has no header line"))]
    MissingSessionHeader { path: String },

    // Errors surfaced by the replay pipeline
    #[snafu(display("Session contains no telemetry for any driver"))]
    EmptySession,
    #[snafu(display("A session load is already in progress"))]
    LoadInProgress,
    #[snafu(display("No session loaded"))]
    NoActiveSession,

    // Errors for per-driver queries
    #[snafu(display("Unknown driver code: {code}"))]
    UnknownDriver { code: String },
    #[snafu(display("No lap {lap} recorded for driver {code}"))]
    UnknownLap { code: String, lap: u32 },
    #[snafu(display("Driver {code} has no timed laps"))]
    NoTimedLaps { code: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Errors for the frame exporter
    #[snafu(display("Error writing frame export file"))]
    ExportError { source: io::Error },
}
