// Library interface for pitwall
// This allows integration tests to access internal modules

pub mod analysis;
pub mod config;
pub mod errors;
pub mod replay;
pub mod source;

// Re-export commonly used types
pub use config::ReplayConfig;
pub use errors::PitwallError;
pub use replay::{Frame, LoadSummary, ReplaySession, SessionState, TrackGeometry};
pub use source::{RecordedSource, SessionData, SessionKind, TelemetrySource};
