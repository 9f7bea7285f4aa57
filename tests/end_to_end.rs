use chrono::{TimeZone, Utc};
use fitparser::profile::MesgNum;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use fitsynth::config::AppConfig;
use fitsynth::export::{self, ExportFormat, FitActivityExporter};
use fitsynth::fit::{verify, Endianness};
use fitsynth::import::ImportManager;
use fitsynth::track::{Record, TrackBuilder};

const ROUTE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="fitsynth tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Park loop</name>
    <trkseg>
      <trkpt lat="55.7500" lon="37.6100"><ele>140</ele></trkpt>
      <trkpt lat="55.7530" lon="37.6130"><ele>142</ele></trkpt>
      <trkpt lat="55.7560" lon="37.6100"><ele>145</ele></trkpt>
      <trkpt lat="55.7590" lon="37.6140"><ele>141</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const CONFIG_TOML: &str = r#"
[activity]
name = "Evening Run"
activity_type = "run"
start = "2024-05-12T18:00:00Z"
desired_speed = 11.0
seed = 42

[output]
endianness = "big"
"#;

struct Generated {
    config: AppConfig,
    records: Vec<Record>,
}

fn generate(dir: &Path) -> Generated {
    let route_path = dir.join("route.gpx");
    let config_path = dir.join("config.toml");
    fs::write(&route_path, ROUTE_GPX).unwrap();
    fs::write(&config_path, CONFIG_TOML).unwrap();

    let config = AppConfig::load_from_file(&config_path).unwrap();
    config.validate().unwrap();

    let waypoints = ImportManager::new().import_file(&route_path).unwrap();
    assert_eq!(waypoints.len(), 4);

    let settings = config.activity.resolve(Utc::now()).unwrap();
    let mut builder = TrackBuilder::new(&settings);
    builder.add_waypoints(&waypoints).unwrap();
    builder.finalize().unwrap();

    Generated {
        config,
        records: builder.into_records(),
    }
}

fn count(records: &[fitparser::FitDataRecord], kind: MesgNum) -> usize {
    records.iter().filter(|r| r.kind() == kind).count()
}

#[test]
fn config_and_route_produce_a_readable_fit_file() {
    let dir = TempDir::new().unwrap();
    let Generated { config, records } = generate(dir.path());

    let start = Utc.with_ymd_and_hms(2024, 5, 12, 18, 0, 0).unwrap();
    assert_eq!(records[0].timestamp, start);

    let metadata = config.activity.metadata(start);
    let output = dir.path().join("activity.fit");
    let exporter = FitActivityExporter::new(config.device.clone())
        .with_endianness(config.output.endianness)
        .with_developer_fields(false);
    let written = exporter.export_file(&metadata, &records, &output).unwrap();

    let bytes = fs::read(&output).unwrap();
    assert_eq!(bytes.len(), written);
    assert!(verify(&bytes).unwrap().is_valid());

    let decoded = fitparser::from_bytes(&bytes).unwrap();
    assert_eq!(decoded[0].kind(), MesgNum::FileId);
    assert_eq!(count(&decoded, MesgNum::FileId), 1);
    assert_eq!(count(&decoded, MesgNum::Activity), 1);
    assert_eq!(count(&decoded, MesgNum::Session), 1);
    assert_eq!(count(&decoded, MesgNum::Lap), 1);
    assert_eq!(count(&decoded, MesgNum::Event), 2);
    // identification plus start and end battery reports
    assert_eq!(count(&decoded, MesgNum::DeviceInfo), 3);
    assert_eq!(count(&decoded, MesgNum::Record), records.len() * 2);

    let session = decoded.iter().find(|r| r.kind() == MesgNum::Session).unwrap();
    assert!(session.fields().iter().any(|f| f.name() == "total_distance"));
    assert!(session.fields().iter().any(|f| f.name() == "sport"));
}

#[test]
fn little_endian_output_decodes_the_same() {
    let dir = TempDir::new().unwrap();
    let Generated { config, records } = generate(dir.path());
    let metadata = config.activity.metadata(records[0].timestamp);

    let exporter = FitActivityExporter::new(config.device.clone()).with_developer_fields(false);
    let mut little = Vec::new();
    exporter
        .clone()
        .with_endianness(Endianness::Little)
        .write(&metadata, &records, &mut little)
        .unwrap();
    let mut big = Vec::new();
    exporter
        .with_endianness(Endianness::Big)
        .write(&metadata, &records, &mut big)
        .unwrap();

    // architecture bytes and multi-byte values differ, sizes do not
    assert_eq!(little.len(), big.len());
    assert_ne!(little, big);

    let little = fitparser::from_bytes(&little).unwrap();
    let big = fitparser::from_bytes(&big).unwrap();
    assert_eq!(little.len(), big.len());
    for (l, b) in little.iter().zip(&big) {
        assert_eq!(l.kind(), b.kind());
    }
}

#[test]
fn developer_fields_keep_file_integrity() {
    let dir = TempDir::new().unwrap();
    let Generated { config, records } = generate(dir.path());
    let metadata = config.activity.metadata(records[0].timestamp);

    let mut with_dev = Vec::new();
    FitActivityExporter::new(config.device.clone())
        .write(&metadata, &records, &mut with_dev)
        .unwrap();
    let mut without_dev = Vec::new();
    FitActivityExporter::new(config.device.clone())
        .with_developer_fields(false)
        .write(&metadata, &records, &mut without_dev)
        .unwrap();

    let integrity = verify(&with_dev).unwrap();
    assert!(integrity.is_valid());
    assert!(with_dev.len() > without_dev.len());
    let needle = config.device.model.as_bytes();
    assert!(with_dev.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn default_output_with_developer_fields_decodes() {
    let dir = TempDir::new().unwrap();
    let Generated { config, records } = generate(dir.path());
    let metadata = config.activity.metadata(records[0].timestamp);

    for endianness in [Endianness::Little, Endianness::Big] {
        let mut bytes = Vec::new();
        FitActivityExporter::new(config.device.clone())
            .with_endianness(endianness)
            .write(&metadata, &records, &mut bytes)
            .unwrap();

        let decoded = fitparser::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.len(), 17 + records.len() * 2, "{} endian", endianness);
        assert_eq!(decoded[0].kind(), MesgNum::FileId);
        assert_eq!(count(&decoded, MesgNum::DeveloperDataId), 1);
        assert_eq!(count(&decoded, MesgNum::FieldDescription), 7);
        assert_eq!(count(&decoded, MesgNum::DeviceInfo), 3);
        assert_eq!(count(&decoded, MesgNum::Activity), 1);
        assert_eq!(count(&decoded, MesgNum::Session), 1);
        assert_eq!(count(&decoded, MesgNum::Lap), 1);
        assert_eq!(count(&decoded, MesgNum::Event), 2);
        assert_eq!(count(&decoded, MesgNum::Record), records.len() * 2);

        let names: Vec<String> = decoded
            .iter()
            .filter(|r| r.kind() == MesgNum::FieldDescription)
            .flat_map(|r| r.fields().iter())
            .filter(|f| f.name() == "field_name")
            .filter_map(|f| match f.value() {
                fitparser::Value::String(name) => Some(name.trim_end_matches('\0').to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "live_activity_id",
                "activity_type",
                "autopause_enabled",
                "mobile_app_version",
                "device_model",
                "device_os_version",
                "device_manufacturer",
            ]
        );

        let session = decoded.iter().find(|r| r.kind() == MesgNum::Session).unwrap();
        assert!(session.fields().iter().any(|f| f.name() == "total_distance"));
        assert!(session.fields().iter().any(|f| f.name() == "sport"));
    }
}

#[test]
fn records_can_be_dumped_for_inspection() {
    let dir = TempDir::new().unwrap();
    let Generated { records, .. } = generate(dir.path());

    let json_path = dir.path().join("records.json");
    let csv_path = dir.path().join("records.csv");
    export::export_records(&records, ExportFormat::from_path(&json_path).unwrap(), &json_path).unwrap();
    export::export_records(&records, ExportFormat::from_path(&csv_path).unwrap(), &csv_path).unwrap();

    let parsed: Vec<Record> = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed, records);

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), records.len() + 1);
    assert!(csv.starts_with("timestamp,latitude,longitude,altitude,speed,distance"));

    let fit_path = dir.path().join("records.fit");
    assert!(export::export_records(&records, ExportFormat::Fit, &fit_path).is_err());
}
