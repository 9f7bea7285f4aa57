use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::error::ImportError;
use crate::import::{has_extension, ImportFormat};
use crate::track::Waypoint;

/// GPX importer for route waypoints
///
/// Reads every track point of every segment of every track, in document
/// order. Files without tracks fall back to their route points. Missing
/// elevations become 0 m.
pub struct GpxImporter;

impl GpxImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse GPX from any reader
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<Waypoint>, ImportError> {
        let document = gpx::read(reader).map_err(|e| ImportError::Parse {
            format: "GPX".to_string(),
            reason: e.to_string(),
        })?;

        let mut waypoints: Vec<Waypoint> = document
            .tracks
            .iter()
            .flat_map(|track| track.segments.iter())
            .flat_map(|segment| segment.points.iter())
            .map(convert)
            .collect();

        if waypoints.is_empty() {
            waypoints = document
                .routes
                .iter()
                .flat_map(|route| route.points.iter())
                .map(convert)
                .collect();
        }

        debug!(
            tracks = document.tracks.len(),
            routes = document.routes.len(),
            waypoints = waypoints.len(),
            "GPX parsed"
        );
        Ok(waypoints)
    }
}

impl Default for GpxImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn convert(point: &gpx::Waypoint) -> Waypoint {
    let position = point.point();
    Waypoint::new(position.y(), position.x(), point.elevation.unwrap_or(0.0))
}

impl ImportFormat for GpxImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "gpx")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Waypoint>, ImportError> {
        let file = File::open(file_path)?;
        self.read(BufReader::new(file))
    }

    fn get_format_name(&self) -> &'static str {
        "GPX"
    }
}
