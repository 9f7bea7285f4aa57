use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::error::EncodeError;
use crate::track::Record;

pub mod csv;
pub mod fit;
pub mod json;

pub use self::fit::FitActivityExporter;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Fit,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "fit" => Ok(ExportFormat::Fit),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Format implied by a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_str(extension)
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("FIT encoding error: {0}")]
    Encode(#[from] EncodeError),
}

/// Dump records for inspection in a text format
pub fn export_records<P: AsRef<Path>>(
    records: &[Record],
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Json => json::export_records(records, output_path),
        ExportFormat::Csv => csv::export_records(records, output_path),
        ExportFormat::Fit => Err(ExportError::UnsupportedFormat(
            "fit records need activity metadata, use FitActivityExporter".to_string(),
        )),
    }
}
