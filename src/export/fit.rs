//! Activity to FIT mapping
//!
//! Turns a finished track into the message sequence a phone recording app
//! uploads: file id, developer field preamble, device info, activity,
//! session and lap summaries, then the timer events around the records and
//! a closing battery report.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::ExportError;
use crate::config::DeviceProfile;
use crate::fit::profile::*;
use crate::fit::{
    DevFieldDefinition, DeveloperData, Endianness, FieldDefinition, FieldValue, FitBaseType, FitFile,
    LocalDefinition, MessageDefinition,
};
use crate::fit_values;
use crate::models::ActivityMetadata;
use crate::track::Record;

/// Index of the single developer application in every file
pub const DEVELOPER_DATA_INDEX: u8 = 0;
/// GPS accuracy in meters reported with each record
pub const RECORD_GPS_ACCURACY_M: u8 = 4;
pub const FIRST_LIVE_ACTIVITY_ID: u64 = 0;
pub const AUTOPAUSE_DISABLED: u8 = 0;

const HEADER_LOCAL_TYPE: u8 = 0;
const RECORD_LOCAL_TYPE: u8 = 1;
const RECORD_DISTANCE_LOCAL_TYPE: u8 = 2;

const LIVE_ACTIVITY_ID: &str = "live_activity_id";
const ACTIVITY_TYPE: &str = "activity_type";
const AUTOPAUSE_ENABLED: &str = "autopause_enabled";
const MOBILE_APP_VERSION: &str = "mobile_app_version";
const DEVICE_MODEL: &str = "device_model";
const DEVICE_OS_VERSION: &str = "device_os_version";
const DEVICE_MANUFACTURER: &str = "device_manufacturer";

/// Seconds since the FIT epoch, clamped to the uint32 range
pub fn fit_timestamp(time: DateTime<Utc>) -> u32 {
    (time.timestamp() - FIT_EPOCH_OFFSET).clamp(0, u32::MAX as i64) as u32
}

/// Degrees to semicircles
pub fn semicircles(degrees: f64) -> i32 {
    (degrees * (1u64 << 31) as f64 / 180.0)
        .round()
        .clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Enhanced altitude: scale 5, offset 500 m
pub fn enhanced_altitude(meters: f64) -> u32 {
    ((meters + 500.0) * 5.0).round().clamp(0.0, u32::MAX as f64) as u32
}

/// km/h to mm/s
pub fn speed_mm_per_sec(kmh: f64) -> u16 {
    (kmh / 3.6 * 1000.0).round().clamp(0.0, u16::MAX as f64) as u16
}

/// km to cm
pub fn distance_cm(km: f64) -> u32 {
    (km * 100_000.0).round().clamp(0.0, u32::MAX as f64) as u32
}

/// Milliseconds, clamped to the uint32 range
pub fn duration_ms(duration: chrono::Duration) -> u32 {
    duration.num_milliseconds().clamp(0, u32::MAX as i64) as u32
}

/// Summary values shared by the activity, session and lap messages
struct ActivityTotals {
    start: u32,
    end: u32,
    duration_ms: u32,
    distance_cm: u32,
}

impl ActivityTotals {
    fn new(metadata: &ActivityMetadata, records: &[Record]) -> Result<Self, ExportError> {
        let last = records
            .last()
            .ok_or_else(|| ExportError::InsufficientData("track has no records".to_string()))?;
        let duration = last.timestamp - metadata.start;
        Ok(Self {
            start: fit_timestamp(metadata.start),
            end: fit_timestamp(metadata.start + duration),
            duration_ms: duration_ms(duration),
            distance_cm: distance_cm(last.distance),
        })
    }
}

/// Builds FIT activity files for one recording device
#[derive(Debug, Clone)]
pub struct FitActivityExporter {
    device: DeviceProfile,
    endianness: Endianness,
    developer_fields: bool,
}

impl FitActivityExporter {
    pub fn new(device: DeviceProfile) -> Self {
        Self {
            device,
            endianness: Endianness::default(),
            developer_fields: true,
        }
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Include or leave out the developer field preamble and values
    pub fn with_developer_fields(mut self, enabled: bool) -> Self {
        self.developer_fields = enabled;
        self
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    fn developer_data(&self) -> DeveloperData {
        let mut dev = DeveloperData::new(DEVELOPER_DATA_INDEX, self.device.app_version);
        dev.add_field(LIVE_ACTIVITY_ID, FitBaseType::Uint64);
        dev.add_field(ACTIVITY_TYPE, FitBaseType::String);
        dev.add_field(AUTOPAUSE_ENABLED, FitBaseType::Enum);
        dev.add_field(MOBILE_APP_VERSION, FitBaseType::String);
        dev.add_field(DEVICE_MODEL, FitBaseType::String);
        dev.add_field(DEVICE_OS_VERSION, FitBaseType::String);
        dev.add_field(DEVICE_MANUFACTURER, FitBaseType::String);
        dev
    }

    /// Assemble the full message sequence for a finished track
    pub fn build(&self, metadata: &ActivityMetadata, records: &[Record]) -> Result<FitFile, ExportError> {
        let totals = ActivityTotals::new(metadata, records)?;
        let dev = self.developer_data();
        let mut file = FitFile::new(self.endianness);

        self.write_header(&mut file, metadata, &dev, &totals)?;
        self.write_body(&mut file, records, &totals)?;
        self.write_footer(&mut file, &totals)?;

        info!(
            activity = %metadata.activity_type,
            records = records.len(),
            messages = file.len(),
            duration_ms = totals.duration_ms,
            distance_cm = totals.distance_cm,
            developer_fields = self.developer_fields,
            "FIT activity assembled"
        );
        Ok(file)
    }

    fn write_header(
        &self,
        file: &mut FitFile,
        metadata: &ActivityMetadata,
        dev: &DeveloperData,
        totals: &ActivityTotals,
    ) -> Result<(), ExportError> {
        let manufacturer = self.device.manufacturer_id;
        let product = self.device.product_id;
        let sport = metadata.activity_type.fit_sport();

        let file_id = MessageDefinition::new(
            FILE_ID_MESG_NUM,
            vec![
                FieldDefinition::of(FILE_ID_MANUFACTURER, FitBaseType::Uint16),
                FieldDefinition::of(FILE_ID_PRODUCT, FitBaseType::Uint16),
                FieldDefinition::of(FILE_ID_TYPE, FitBaseType::Enum),
                FieldDefinition::of(FILE_ID_TIME_CREATED, FitBaseType::Uint32),
            ],
        )
        .bind(HEADER_LOCAL_TYPE);
        let values = fit_values![manufacturer, product, FILE_TYPE_ACTIVITY, totals.start];
        add_with_data(file, file_id, values)?;

        if self.developer_fields {
            file.add_messages(dev.preamble(HEADER_LOCAL_TYPE)?)?;
        }

        let mut values = fit_values![manufacturer, product];
        let mut dev_fields = Vec::new();
        if self.developer_fields {
            let strings = [
                (MOBILE_APP_VERSION, &self.device.mobile_app_version),
                (DEVICE_MANUFACTURER, &self.device.manufacturer),
                (DEVICE_MODEL, &self.device.model),
                (DEVICE_OS_VERSION, &self.device.os_version),
            ];
            for (name, value) in strings {
                dev_fields.push(dev.string_field(name, value)?);
                values.push(FieldValue::from(value.as_str()));
            }
        }
        let device_info = definition_with(
            DEVICE_INFO_MESG_NUM,
            vec![
                FieldDefinition::of(DEVICE_INFO_MANUFACTURER, FitBaseType::Uint16),
                FieldDefinition::of(DEVICE_INFO_PRODUCT, FitBaseType::Uint16),
            ],
            dev_fields,
        )
        .bind(HEADER_LOCAL_TYPE);
        add_with_data(file, device_info, values)?;

        let activity = MessageDefinition::new(
            ACTIVITY_MESG_NUM,
            vec![
                FieldDefinition::of(ACTIVITY_NUM_SESSIONS, FitBaseType::Uint16),
                FieldDefinition::of(ACTIVITY_TOTAL_TIMER_TIME, FitBaseType::Uint32),
                FieldDefinition::of(ACTIVITY_EVENT, FitBaseType::Enum),
                FieldDefinition::of(ACTIVITY_EVENT_TYPE, FitBaseType::Enum),
            ],
        )
        .bind(HEADER_LOCAL_TYPE);
        let values = fit_values![1u16, totals.duration_ms, EVENT_ACTIVITY, EVENT_TYPE_STOP];
        add_with_data(file, activity, values)?;

        let activity_name = metadata.activity_type.name();
        let mut values = fit_values![
            totals.duration_ms,
            totals.start,
            totals.duration_ms,
            totals.distance_cm,
            sport,
            EVENT_SESSION,
            EVENT_TYPE_STOP,
            1u16,
        ];
        let mut dev_fields = Vec::new();
        if self.developer_fields {
            dev_fields.push(dev.field(LIVE_ACTIVITY_ID, 0)?);
            dev_fields.push(dev.string_field(ACTIVITY_TYPE, activity_name)?);
            dev_fields.push(dev.field(AUTOPAUSE_ENABLED, 0)?);
            values.extend(fit_values![FIRST_LIVE_ACTIVITY_ID, activity_name, AUTOPAUSE_DISABLED]);
        }
        let session = definition_with(
            SESSION_MESG_NUM,
            vec![
                FieldDefinition::of(TOTAL_ELAPSED_TIME, FitBaseType::Uint32),
                FieldDefinition::of(START_TIME, FitBaseType::Uint32),
                FieldDefinition::of(TOTAL_TIMER_TIME, FitBaseType::Uint32),
                FieldDefinition::of(TOTAL_DISTANCE, FitBaseType::Uint32),
                FieldDefinition::of(SESSION_SPORT, FitBaseType::Enum),
                FieldDefinition::of(EVENT, FitBaseType::Enum),
                FieldDefinition::of(EVENT_TYPE, FitBaseType::Enum),
                FieldDefinition::of(SESSION_NUM_LAPS, FitBaseType::Uint16),
            ],
            dev_fields,
        )
        .bind(HEADER_LOCAL_TYPE);
        add_with_data(file, session, values)?;

        let lap = MessageDefinition::new(
            LAP_MESG_NUM,
            vec![
                FieldDefinition::of(TOTAL_ELAPSED_TIME, FitBaseType::Uint32),
                FieldDefinition::of(START_TIME, FitBaseType::Uint32),
                FieldDefinition::of(TOTAL_TIMER_TIME, FitBaseType::Uint32),
                FieldDefinition::of(TOTAL_DISTANCE, FitBaseType::Uint32),
                FieldDefinition::of(EVENT, FitBaseType::Enum),
                FieldDefinition::of(EVENT_TYPE, FitBaseType::Enum),
                FieldDefinition::of(LAP_SPORT, FitBaseType::Enum),
                FieldDefinition::of(LAP_TRIGGER, FitBaseType::Enum),
            ],
        )
        .bind(HEADER_LOCAL_TYPE);
        let values = fit_values![
            totals.duration_ms,
            totals.start,
            totals.duration_ms,
            totals.distance_cm,
            EVENT_LAP,
            EVENT_TYPE_STOP,
            sport,
            LAP_TRIGGER_SESSION_END,
        ];
        add_with_data(file, lap, values)?;

        self.write_battery(file, totals.start)?;
        debug!(messages = file.len(), "FIT header messages written");
        Ok(())
    }

    fn write_body(&self, file: &mut FitFile, records: &[Record], totals: &ActivityTotals) -> Result<(), ExportError> {
        let event = timer_event_definition().bind(HEADER_LOCAL_TYPE);
        add_with_data(
            file,
            event.clone(),
            fit_values![EVENT_TIMER, totals.start, 0u32, EVENT_TYPE_START],
        )?;

        let record = MessageDefinition::new(
            RECORD_MESG_NUM,
            vec![
                FieldDefinition::of(RECORD_POSITION_LAT, FitBaseType::Sint32),
                FieldDefinition::of(RECORD_POSITION_LONG, FitBaseType::Sint32),
                FieldDefinition::of(RECORD_ENHANCED_ALTITUDE, FitBaseType::Uint32),
                FieldDefinition::of(RECORD_SPEED, FitBaseType::Uint16),
                FieldDefinition::of(RECORD_GPS_ACCURACY, FitBaseType::Uint8),
                FieldDefinition::of(TIMESTAMP, FitBaseType::Uint32),
            ],
        )
        .bind(RECORD_LOCAL_TYPE);
        let record_distance = MessageDefinition::new(
            RECORD_MESG_NUM,
            vec![
                FieldDefinition::of(TIMESTAMP, FitBaseType::Uint32),
                FieldDefinition::of(RECORD_DISTANCE, FitBaseType::Uint32),
            ],
        )
        .bind(RECORD_DISTANCE_LOCAL_TYPE);
        file.add_message(record.clone())?;
        file.add_message(record_distance.clone())?;

        for r in records {
            let timestamp = fit_timestamp(r.timestamp);
            file.add_message(record.construct_data(fit_values![
                semicircles(r.position.lat),
                semicircles(r.position.lon),
                enhanced_altitude(r.position.altitude),
                speed_mm_per_sec(r.speed),
                RECORD_GPS_ACCURACY_M,
                timestamp,
            ])?)?;
            file.add_message(record_distance.construct_data(fit_values![timestamp, distance_cm(r.distance)])?)?;
        }

        file.add_message(event.construct_data(fit_values![EVENT_TIMER, totals.end, 0u32, EVENT_TYPE_STOP])?)?;
        Ok(())
    }

    fn write_footer(&self, file: &mut FitFile, totals: &ActivityTotals) -> Result<(), ExportError> {
        self.write_battery(file, totals.end)
    }

    fn write_battery(&self, file: &mut FitFile, timestamp: u32) -> Result<(), ExportError> {
        let battery = MessageDefinition::new(
            DEVICE_INFO_MESG_NUM,
            vec![
                FieldDefinition::of(DEVICE_INFO_MANUFACTURER, FitBaseType::Uint16),
                FieldDefinition::of(DEVICE_INFO_PRODUCT, FitBaseType::Uint16),
                FieldDefinition::of(TIMESTAMP, FitBaseType::Uint32),
                FieldDefinition::of(DEVICE_INFO_BATTERY_STATUS, FitBaseType::Uint8),
            ],
        )
        .bind(HEADER_LOCAL_TYPE);
        let values = fit_values![
            self.device.manufacturer_id,
            self.device.product_id,
            timestamp,
            BATTERY_STATUS_GOOD,
        ];
        add_with_data(file, battery, values)
    }

    /// Encode the activity into any writer, returning the byte count
    pub fn write<W: Write>(
        &self,
        metadata: &ActivityMetadata,
        records: &[Record],
        w: &mut W,
    ) -> Result<usize, ExportError> {
        let file = self.build(metadata, records)?;
        Ok(file.encode(w)?)
    }

    /// Encode the activity into a file at `output_path`
    pub fn export_file<P: AsRef<Path>>(
        &self,
        metadata: &ActivityMetadata,
        records: &[Record],
        output_path: P,
    ) -> Result<usize, ExportError> {
        let mut writer = BufWriter::new(File::create(output_path)?);
        let written = self.write(metadata, records, &mut writer)?;
        writer.flush()?;
        Ok(written)
    }
}

fn definition_with(
    global_number: u16,
    fields: Vec<FieldDefinition>,
    developer_fields: Vec<DevFieldDefinition>,
) -> MessageDefinition {
    MessageDefinition::new(global_number, fields).with_developer_fields(developer_fields)
}

fn timer_event_definition() -> MessageDefinition {
    MessageDefinition::new(
        EVENT_MESG_NUM,
        vec![
            FieldDefinition::of(EVENT, FitBaseType::Enum),
            FieldDefinition::of(TIMESTAMP, FitBaseType::Uint32),
            FieldDefinition::of(EVENT_DATA, FitBaseType::Uint32),
            FieldDefinition::of(EVENT_TYPE, FitBaseType::Enum),
        ],
    )
}

/// Bind a definition and add it followed by one data message
fn add_with_data(
    file: &mut FitFile,
    definition: LocalDefinition,
    values: Vec<FieldValue>,
) -> Result<(), ExportError> {
    let data = definition.construct_data(values)?;
    file.add_message(definition)?;
    file.add_message(data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{verify, Encode, FitMessage, FitValue};
    use crate::geo::Coordinate;
    use crate::models::ActivityType;
    use chrono::{Duration, TimeZone};

    fn metadata() -> ActivityMetadata {
        ActivityMetadata {
            name: "Test".to_string(),
            description: String::new(),
            activity_type: ActivityType::Run,
            start: Utc.with_ymd_and_hms(2021, 8, 1, 6, 0, 0).unwrap(),
        }
    }

    fn records(start: DateTime<Utc>, count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| Record {
                position: Coordinate::new(55.75 + i as f64 * 1e-4, 37.61, 150.0),
                timestamp: start + Duration::seconds(i as i64),
                speed: 10.0,
                distance: i as f64 * 0.0028,
            })
            .collect()
    }

    fn globals(file: &FitFile) -> Vec<(bool, u16)> {
        file.messages()
            .iter()
            .map(|m| match m {
                FitMessage::Definition(d) => (true, d.definition().global_number),
                FitMessage::Data(d) => (false, d.local_definition().definition().global_number),
            })
            .collect()
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(semicircles(0.0), 0);
        assert_eq!(semicircles(90.0), 1 << 30);
        assert_eq!(semicircles(-180.0), i32::MIN);
        assert_eq!(semicircles(180.0), i32::MAX);
        assert_eq!(enhanced_altitude(0.0), 2500);
        assert_eq!(enhanced_altitude(-600.0), 0);
        assert_eq!(speed_mm_per_sec(36.0), 10_000);
        assert_eq!(distance_cm(1.5), 150_000);
        assert_eq!(duration_ms(Duration::milliseconds(1500)), 1500);
        assert_eq!(duration_ms(Duration::seconds(-1)), 0);

        let epoch = Utc.with_ymd_and_hms(1989, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(fit_timestamp(epoch), 0);
        assert_eq!(fit_timestamp(epoch + Duration::milliseconds(2999)), 2);
    }

    #[test]
    fn test_message_order() {
        let metadata = metadata();
        let records = records(metadata.start, 3);
        let file = FitActivityExporter::new(DeviceProfile::default())
            .build(&metadata, &records)
            .unwrap();

        let order = globals(&file);
        let expected_head = vec![
            (true, FILE_ID_MESG_NUM),
            (false, FILE_ID_MESG_NUM),
            (true, DEVELOPER_DATA_ID_MESG_NUM),
            (false, DEVELOPER_DATA_ID_MESG_NUM),
            (true, FIELD_DESCRIPTION_MESG_NUM),
        ];
        assert_eq!(&order[..5], &expected_head[..]);
        // seven field descriptions
        assert!(order[5..12].iter().all(|m| *m == (false, FIELD_DESCRIPTION_MESG_NUM)));

        let expected_tail = vec![
            (true, DEVICE_INFO_MESG_NUM),
            (false, DEVICE_INFO_MESG_NUM),
            (true, ACTIVITY_MESG_NUM),
            (false, ACTIVITY_MESG_NUM),
            (true, SESSION_MESG_NUM),
            (false, SESSION_MESG_NUM),
            (true, LAP_MESG_NUM),
            (false, LAP_MESG_NUM),
            (true, DEVICE_INFO_MESG_NUM),
            (false, DEVICE_INFO_MESG_NUM),
            (true, EVENT_MESG_NUM),
            (false, EVENT_MESG_NUM),
            (true, RECORD_MESG_NUM),
            (true, RECORD_MESG_NUM),
        ];
        assert_eq!(&order[12..26], &expected_tail[..]);
        assert!(order[26..32].iter().all(|m| *m == (false, RECORD_MESG_NUM)));
        assert_eq!(
            &order[32..],
            &[
                (false, EVENT_MESG_NUM),
                (true, DEVICE_INFO_MESG_NUM),
                (false, DEVICE_INFO_MESG_NUM)
            ]
        );
    }

    #[test]
    fn test_device_info_bytes() {
        let metadata = metadata();
        let records = records(metadata.start, 2);
        let file = FitActivityExporter::new(DeviceProfile::default())
            .with_endianness(Endianness::Big)
            .build(&metadata, &records)
            .unwrap();

        let mut buf = Vec::new();
        for message in &file.messages()[12..14] {
            message.encode(&mut buf, Endianness::Big).unwrap();
        }

        let mut expected = vec![
            0x60, 0x00, 0x01, 0x00, 0x17, 0x02, 0x02, 0x02, 0x84, 0x04, 0x02, 0x84, 0x04, 0x03, 0x11, 0x00,
            0x06, 0x07, 0x00, 0x04, 0x11, 0x00, 0x05, 0x03, 0x00,
        ];
        expected.extend([0x00, 0x01, 0x09, 0x00, 0x66]);
        expected.extend(b"230.10 (1221988)\0");
        expected.extend(b"Xiaomi\0");
        expected.extend(b"Redmi Note 9 Pro\0");
        expected.extend(b"10\0");
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_without_developer_fields() {
        let metadata = metadata();
        let records = records(metadata.start, 4);
        let file = FitActivityExporter::new(DeviceProfile::default())
            .with_developer_fields(false)
            .build(&metadata, &records)
            .unwrap();

        let order = globals(&file);
        assert!(!order.iter().any(|(_, g)| *g == DEVELOPER_DATA_ID_MESG_NUM));
        assert!(!order.iter().any(|(_, g)| *g == FIELD_DESCRIPTION_MESG_NUM));
        assert!(file.messages().iter().all(|m| match m {
            FitMessage::Definition(d) => d.definition().developer_fields.is_empty(),
            FitMessage::Data(_) => true,
        }));
        // 2 file id + 2 device + 2 activity + 2 session + 2 lap + 2 battery
        // + 2 event + 2 record definitions + 8 records + 1 stop + 2 battery
        assert_eq!(file.len(), 27);
    }

    #[test]
    fn test_session_totals() {
        let metadata = metadata();
        let records = records(metadata.start, 11);
        let file = FitActivityExporter::new(DeviceProfile::default())
            .with_developer_fields(false)
            .build(&metadata, &records)
            .unwrap();

        let session = file
            .messages()
            .iter()
            .find_map(|m| match m {
                FitMessage::Data(d) if d.local_definition().definition().global_number == SESSION_MESG_NUM => {
                    Some(d.values().to_vec())
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(session[0], FitValue::Uint32(10_000));
        assert_eq!(session[1], FitValue::Uint32(fit_timestamp(metadata.start)));
        assert_eq!(session[3], FitValue::Uint32(distance_cm(0.028)));
        assert_eq!(session[4], FitValue::Enum(1));
    }

    #[test]
    fn test_empty_track_rejected() {
        let err = FitActivityExporter::new(DeviceProfile::default())
            .build(&metadata(), &[])
            .unwrap_err();
        assert!(matches!(err, ExportError::InsufficientData(_)));
    }

    #[test]
    fn test_write_produces_valid_file() {
        let metadata = metadata();
        let records = records(metadata.start, 30);
        let exporter = FitActivityExporter::new(DeviceProfile::default());

        let mut bytes = Vec::new();
        let written = exporter.write(&metadata, &records, &mut bytes).unwrap();
        assert_eq!(written, bytes.len());
        assert!(verify(&bytes).unwrap().is_valid());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.fit");
        exporter.export_file(&metadata, &records, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
