use super::ExportError;
use crate::track::Record;
use std::io::Write;
use std::path::Path;

/// Export synthesized records to JSON format
pub fn export_records<P: AsRef<Path>>(records: &[Record], output_path: P) -> Result<(), ExportError> {
    export_json(&records, output_path)
}

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let json_data =
        serde_json::to_string_pretty(data).map_err(|e| ExportError::SerializationError(e.to_string()))?;

    let mut file = std::fs::File::create(output_path)?;
    file.write_all(json_data.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_records() {
        let records = vec![Record {
            position: Coordinate::new(55.5, 37.25, 120.0),
            timestamp: Utc.with_ymd_and_hms(2021, 8, 1, 6, 0, 0).unwrap(),
            speed: 1.5,
            distance: 0.0,
        }];

        let temp_file = NamedTempFile::new().unwrap();
        export_records(&records, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"latitude\": 55.5"));
        assert!(content.contains("\"longitude\": 37.25"));
        assert!(content.contains("\"timestamp\": \"2021-08-01T06:00:00Z\""));

        let parsed: Vec<Record> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_export_json_generic() {
        let data = serde_json::json!({ "records": 3 });
        let temp_file = NamedTempFile::new().unwrap();
        export_json(&data, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"records\": 3"));
    }
}
