// Library interface for fitsynth
// The CLI and the integration tests both build on these modules

pub mod config;
pub mod error;
pub mod export;
pub mod fit;
pub mod geo;
pub mod import;
pub mod logging;
pub mod models;
pub mod track;

// Re-export commonly used types for convenience
pub use config::{ActivityConfig, AppConfig, DeviceProfile, OutputSettings};
pub use error::{ConfigError, EncodeError, FitSynthError, ImportError, Result, TrackError};
pub use export::{ExportError, ExportFormat, FitActivityExporter};
pub use fit::{Endianness, FitFile};
pub use geo::Coordinate;
pub use import::{ImportFormat, ImportManager};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{ActivityMetadata, ActivityType};
pub use track::{Record, TrackBuilder, TrackSettings, TrackState, Waypoint};
