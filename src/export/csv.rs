use super::ExportError;
use crate::track::Record;
use std::io::Write;
use std::path::Path;

/// Export synthesized records to CSV format
pub fn export_records<P: AsRef<Path>>(records: &[Record], output_path: P) -> Result<(), ExportError> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    write_records(records, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Write the CSV header and one row per record
pub fn write_records<W: Write>(records: &[Record], w: &mut W) -> Result<(), ExportError> {
    writeln!(w, "timestamp,latitude,longitude,altitude,speed,distance")?;

    for record in records {
        writeln!(
            w,
            "{},{:.7},{:.7},{:.1},{:.3},{:.5}",
            record.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            record.position.lat,
            record.position.lon,
            record.position.altitude,
            record.speed,
            record.distance
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_records() {
        let start = Utc.with_ymd_and_hms(2021, 8, 1, 6, 0, 0).unwrap();
        let records = vec![
            Record {
                position: Coordinate::new(55.5, 37.25, 120.0),
                timestamp: start,
                speed: 1.5,
                distance: 0.0,
            },
            Record {
                position: Coordinate::new(55.5001, 37.25, 120.5),
                timestamp: start + Duration::milliseconds(1250),
                speed: 2.0,
                distance: 0.0111,
            },
        ];

        let temp_file = NamedTempFile::new().unwrap();
        export_records(&records, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,latitude,longitude,altitude,speed,distance");
        assert_eq!(
            lines[1],
            "2021-08-01T06:00:00.000Z,55.5000000,37.2500000,120.0,1.500,0.00000"
        );
        assert!(lines[2].starts_with("2021-08-01T06:00:01.250Z,55.5001000"));
    }
}
