use std::path::Path;
use tracing::info;

use crate::error::ImportError;
use crate::track::Waypoint;

pub mod csv;
pub mod gpx;

/// Trait for reading route waypoints from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read waypoints from the file, in route order
    fn import_file(&self, file_path: &Path) -> Result<Vec<Waypoint>, ImportError>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

pub(crate) fn has_extension(file_path: &Path, extension: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> =
            vec![Box::new(gpx::GpxImporter::new()), Box::new(csv::CsvImporter::new())];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<Waypoint>, ImportError> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat(file_path.display().to_string()))?;

        let waypoints = importer.import_file(file_path)?;
        if waypoints.is_empty() {
            return Err(ImportError::NoWaypoints(file_path.display().to_string()));
        }

        info!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            waypoints = waypoints.len(),
            "Waypoints imported"
        );
        Ok(waypoints)
    }

    /// Names of the supported formats
    pub fn supported_formats(&self) -> Vec<&'static str> {
        self.importers.iter().map(|i| i.get_format_name()).collect()
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_import_manager_creation() {
        let manager = ImportManager::new();
        assert_eq!(manager.supported_formats(), vec!["GPX", "CSV"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let manager = ImportManager::new();
        let err = manager.import_file(Path::new("route.kml")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_empty_source_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.csv");
        fs::write(&path, "lat,lon\n").unwrap();

        let err = ImportManager::new().import_file(&path).unwrap_err();
        assert!(matches!(err, ImportError::NoWaypoints(_)));
    }

    #[test]
    fn test_extension_match_ignores_case() {
        assert!(has_extension(Path::new("route.GPX"), "gpx"));
        assert!(has_extension(Path::new("dir.csv/route.Csv"), "csv"));
        assert!(!has_extension(Path::new("route.gpx.bak"), "gpx"));
        assert!(!has_extension(Path::new("gpx"), "gpx"));
    }
}
