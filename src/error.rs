//! Unified error hierarchy for fitsynth
//!
//! Every track and codec operation reports one of the structured errors below.
//! None of them are transient: they come from bad input or from a mapping layer
//! that asked the codec for something the FIT protocol cannot express.

use crate::export::ExportError;
use crate::fit::types::FitBaseType;
use thiserror::Error;

/// Top-level error type for all fitsynth operations
#[derive(Debug, Error)]
pub enum FitSynthError {
    /// Track synthesis errors
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    /// FIT encoding errors
    #[error("FIT encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Waypoint import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors raised while synthesizing a track
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    /// Latitude outside [-90, 90]
    #[error("latitude {0} isn't in bounds [-90, 90]")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180]
    #[error("longitude {0} isn't in bounds [-180, 180]")]
    InvalidLongitude(f64),

    /// A waypoint was added after the track was finalized
    #[error("cannot add waypoints to a finalized track")]
    Finalized,

    /// finalize() was called twice
    #[error("track has already been finalized")]
    AlreadyFinalized,

    /// Fade-out needs at least as much track as it lasts
    #[error("unable to fade out a track lasting {duration:.1}s with a {fade_out}s fade-out")]
    TrackTooShort { duration: f64, fade_out: u32 },
}

/// Protocol and encoding errors
///
/// These point at a programming error in whatever builds the messages and are
/// never worth retrying.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Declared field size does not match the base type
    #[error("field with base type {base_type} has unexpected size {declared} (instead of {expected})")]
    SizeMismatch {
        base_type: FitBaseType,
        declared: u8,
        expected: u8,
    },

    /// Value tag does not match the field's base type
    #[error("value of type {found} does not fit a field with base type {expected}")]
    TypeMismatch {
        expected: FitBaseType,
        found: String,
    },

    /// Wrong number of values for a definition
    #[error("unexpected number of field values: expected {expected}, got {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// Architecture selector other than little (0) or big (1)
    #[error("unknown endianness selector {0}")]
    UnknownEndianness(String),

    /// Local message types are four bits wide
    #[error("invalid local message type {0} (> 15)")]
    LocalTypeOverflow(u8),

    /// The developer-data flag only exists on definition headers
    #[error("only definition messages can set the developer data flag")]
    MsgSpecificMisuse,

    /// Developer field definition and its description disagree on the index
    #[error("developer data index mismatch: definition uses {definition}, field description uses {description}")]
    DevDataIndexMismatch { definition: u8, description: u8 },

    /// A string field must keep room for the terminating zero
    #[error("invalid string size {declared} (< {required} expected)")]
    StringSizeTooSmall { declared: u8, required: usize },

    /// Base type byte outside the catalog
    #[error("unknown FIT base type 0x{0:02X}")]
    UnknownBaseType(u8),

    /// Developer field used without being registered
    #[error("developer field '{0}' has no field description")]
    UnknownDeveloperField(String),

    /// Data message added before its local type was defined in the file
    #[error("local message type {0} is not bound to this data message's definition")]
    UndefinedLocalType(u8),

    /// Output sink failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A value is outside its allowed range
    #[error("{field}: {reason}")]
    OutOfRange { field: String, reason: String },

    /// A value could not be parsed
    #[error("cannot parse {field}: {reason}")]
    Parse { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::OutOfRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Waypoint import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// No importer handles the file
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    Parse { format: String, reason: String },

    /// The source contained no usable waypoints
    #[error("No waypoints found in {0}")]
    NoWaypoints(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fitsynth operations
pub type Result<T> = std::result::Result<T, FitSynthError>;

impl FitSynthError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FitSynthError::Io(_)
                | FitSynthError::Import(ImportError::Io(_))
                | FitSynthError::Export(ExportError::IoError(_))
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FitSynthError::Track(TrackError::InvalidLatitude(_))
            | FitSynthError::Track(TrackError::InvalidLongitude(_)) => ErrorSeverity::Warning,
            FitSynthError::Config(_) => ErrorSeverity::Warning,
            FitSynthError::Import(ImportError::NoWaypoints(_)) => ErrorSeverity::Warning,
            FitSynthError::Encode(EncodeError::Io(_)) => ErrorSeverity::Error,
            FitSynthError::Export(ExportError::Encode(EncodeError::Io(_))) => ErrorSeverity::Error,
            FitSynthError::Export(ExportError::Encode(_)) => ErrorSeverity::Critical,
            FitSynthError::Encode(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FitSynthError::Track(TrackError::TrackTooShort { fade_out, .. }) => {
                format!(
                    "The route is too short to slow down over {} seconds. Use a longer route or a shorter fade.",
                    fade_out
                )
            }
            FitSynthError::Import(ImportError::NoWaypoints(source)) => {
                format!("No route points could be read from {}", source)
            }
            FitSynthError::Encode(_) => {
                format!("Internal FIT encoding failure: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal invariant broken
    Critical,
    /// Error that prevents operation
    Error,
    /// Bad user input
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
