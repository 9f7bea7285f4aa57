//! FIT binary encoder
//!
//! Implements the subset of the Garmin FIT protocol needed to write activity
//! files: base types, definition and data messages with developer fields,
//! the file header and CRC-16.

pub mod crc;
pub mod developer;
pub mod field;
pub mod file;
pub mod message;
pub mod profile;
pub mod types;

pub use crc::{checksum, Crc16};
pub use developer::{DevFieldDefinition, DeveloperData, DeveloperDataId, FieldDescription};
pub use field::FieldDefinition;
pub use file::{verify, FitFile, FitIntegrity};
pub use message::{
    DataMessage, Encode, FitMessage, LocalDefinition, MessageClass, MessageDefinition, MessageHeader,
};
pub use types::{Endianness, FieldValue, FitBaseType, FitValue};
