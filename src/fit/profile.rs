//! Global message and field numbers from the FIT profile
//!
//! Only the messages an activity file needs are listed.

pub const FILE_ID_MESG_NUM: u16 = 0;
pub const SESSION_MESG_NUM: u16 = 18;
pub const LAP_MESG_NUM: u16 = 19;
pub const RECORD_MESG_NUM: u16 = 20;
pub const EVENT_MESG_NUM: u16 = 21;
pub const DEVICE_INFO_MESG_NUM: u16 = 23;
pub const ACTIVITY_MESG_NUM: u16 = 34;
pub const FIELD_DESCRIPTION_MESG_NUM: u16 = 206;
pub const DEVELOPER_DATA_ID_MESG_NUM: u16 = 207;

/// Field number shared by every message carrying a timestamp
pub const TIMESTAMP: u8 = 253;

// file_id
pub const FILE_ID_TYPE: u8 = 0;
pub const FILE_ID_MANUFACTURER: u8 = 1;
pub const FILE_ID_PRODUCT: u8 = 2;
pub const FILE_ID_TIME_CREATED: u8 = 4;

// developer_data_id
pub const DEV_DEVELOPER_DATA_INDEX: u8 = 3;
pub const DEV_APPLICATION_VERSION: u8 = 4;

// field_description
pub const FIELD_DESC_DEVELOPER_DATA_INDEX: u8 = 0;
pub const FIELD_DESC_FIELD_DEFINITION_NUMBER: u8 = 1;
pub const FIELD_DESC_BASE_TYPE: u8 = 2;
pub const FIELD_DESC_FIELD_NAME: u8 = 3;

// device_info
pub const DEVICE_INFO_MANUFACTURER: u8 = 2;
pub const DEVICE_INFO_PRODUCT: u8 = 4;
pub const DEVICE_INFO_BATTERY_STATUS: u8 = 11;

// activity
pub const ACTIVITY_TOTAL_TIMER_TIME: u8 = 0;
pub const ACTIVITY_NUM_SESSIONS: u8 = 1;
pub const ACTIVITY_EVENT: u8 = 3;
pub const ACTIVITY_EVENT_TYPE: u8 = 4;

// session and lap share these
pub const EVENT: u8 = 0;
pub const EVENT_TYPE: u8 = 1;
pub const START_TIME: u8 = 2;
pub const TOTAL_ELAPSED_TIME: u8 = 7;
pub const TOTAL_TIMER_TIME: u8 = 8;
pub const TOTAL_DISTANCE: u8 = 9;

// session
pub const SESSION_SPORT: u8 = 5;
pub const SESSION_NUM_LAPS: u8 = 26;

// lap
pub const LAP_TRIGGER: u8 = 24;
pub const LAP_SPORT: u8 = 25;

// event
pub const EVENT_DATA: u8 = 3;

// record
pub const RECORD_POSITION_LAT: u8 = 0;
pub const RECORD_POSITION_LONG: u8 = 1;
pub const RECORD_DISTANCE: u8 = 5;
pub const RECORD_SPEED: u8 = 6;
pub const RECORD_GPS_ACCURACY: u8 = 31;
pub const RECORD_ENHANCED_ALTITUDE: u8 = 78;

/// file type: activity
pub const FILE_TYPE_ACTIVITY: u8 = 4;
/// event: timer
pub const EVENT_TIMER: u8 = 0;
/// event: session
pub const EVENT_SESSION: u8 = 8;
/// event: lap
pub const EVENT_LAP: u8 = 9;
/// event: activity
pub const EVENT_ACTIVITY: u8 = 26;
/// event_type: start
pub const EVENT_TYPE_START: u8 = 0;
/// event_type: stop
pub const EVENT_TYPE_STOP: u8 = 1;
/// lap_trigger: session_end
pub const LAP_TRIGGER_SESSION_END: u8 = 7;
/// battery_status: good
pub const BATTERY_STATUS_GOOD: u8 = 3;

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z)
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;
