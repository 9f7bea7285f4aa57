use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::ImportError;
use crate::import::{has_extension, ImportFormat};
use crate::track::Waypoint;

/// CSV importer with flexible column mapping
///
/// Needs latitude and longitude columns; altitude is optional and
/// defaults to 0 m.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

/// Column positions resolved from the header row
struct Columns {
    latitude: usize,
    longitude: usize,
    altitude: Option<usize>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(&mut column_mapping, "latitude", &["latitude", "lat", "position_lat"]);
        Self::add_mapping(
            &mut column_mapping,
            "longitude",
            &["longitude", "lng", "lon", "long", "position_long"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "altitude",
            &["altitude", "elevation", "alt", "ele", "elev"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn resolve_columns(&self, headers: &csv::StringRecord) -> Result<Columns, ImportError> {
        let find = |standard: &str| {
            headers
                .iter()
                .position(|h| self.normalize_column_name(h) == standard)
        };
        let missing = |column: &str| ImportError::Parse {
            format: "CSV".to_string(),
            reason: format!("missing {} column", column),
        };

        Ok(Columns {
            latitude: find("latitude").ok_or_else(|| missing("latitude"))?,
            longitude: find("longitude").ok_or_else(|| missing("longitude"))?,
            altitude: find("altitude"),
        })
    }

    /// Parse CSV from any reader
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<Waypoint>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(parse_error)?.clone();
        let columns = self.resolve_columns(&headers)?;

        let mut waypoints = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(parse_error)?;
            // header is line 1
            let line = index + 2;

            let lat = parse_number(&row, columns.latitude, line)?;
            let lon = parse_number(&row, columns.longitude, line)?;
            let altitude = match columns.altitude {
                Some(column) if row.get(column).map_or(false, |v| !v.is_empty()) => {
                    parse_number(&row, column, line)?
                }
                _ => 0.0,
            };
            waypoints.push(Waypoint::new(lat, lon, altitude));
        }

        debug!(waypoints = waypoints.len(), "CSV parsed");
        Ok(waypoints)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(e: csv::Error) -> ImportError {
    ImportError::Parse {
        format: "CSV".to_string(),
        reason: e.to_string(),
    }
}

fn parse_number(row: &csv::StringRecord, column: usize, line: usize) -> Result<f64, ImportError> {
    let raw = row.get(column).unwrap_or_default();
    raw.parse::<f64>().map_err(|_| ImportError::Parse {
        format: "CSV".to_string(),
        reason: format!("line {}: '{}' is not a number", line, raw),
    })
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Waypoint>, ImportError> {
        let file = std::fs::File::open(file_path)?;
        self.read(std::io::BufReader::new(file))
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}
