use std::io::Write;

use super::types::{Endianness, FitBaseType, FitValue};
use crate::error::EncodeError;

/// One standard field of a definition message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub number: u8,
    /// Size in bytes
    pub size: u8,
    pub base_type: FitBaseType,
}

impl FieldDefinition {
    /// Field with an explicit size; checked when encoded
    pub fn new(number: u8, size: u8, base_type: FitBaseType) -> Self {
        Self {
            number,
            size,
            base_type,
        }
    }

    /// Field of a fixed-size type using its canonical size
    pub fn of(number: u8, base_type: FitBaseType) -> Self {
        Self::new(number, base_type.canonical_size().unwrap_or(1), base_type)
    }

    /// String field holding up to `size - 1` bytes plus the terminating zero
    pub fn string(number: u8, size: u8) -> Self {
        Self::new(number, size, FitBaseType::String)
    }

    /// Check the declared size against the base type
    pub fn validate(&self) -> Result<(), EncodeError> {
        validate_size(self.base_type, self.size)
    }

    /// Write the (number, size, base type) triple of a definition message
    pub fn encode_definition<W: Write>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.validate()?;
        w.write_all(&[self.number, self.size, self.base_type.code()])?;
        Ok(())
    }

    /// Write a value for this field in a data message
    pub fn encode_value<W: Write>(
        &self,
        w: &mut W,
        value: &FitValue,
        endianness: Endianness,
    ) -> Result<(), EncodeError> {
        encode_value(self.base_type, self.size, w, value, endianness)
    }
}

pub(crate) fn validate_size(base_type: FitBaseType, size: u8) -> Result<(), EncodeError> {
    let expected = match base_type.canonical_size() {
        Some(expected) => expected,
        None if size >= 1 => return Ok(()),
        None => 1,
    };
    if size != expected {
        return Err(EncodeError::SizeMismatch {
            base_type,
            declared: size,
            expected,
        });
    }
    Ok(())
}

pub(crate) fn encode_value<W: Write>(
    base_type: FitBaseType,
    size: u8,
    w: &mut W,
    value: &FitValue,
    endianness: Endianness,
) -> Result<(), EncodeError> {
    validate_size(base_type, size)?;
    base_type.validate_value(value)?;
    value.encode(w, endianness, size)
}
