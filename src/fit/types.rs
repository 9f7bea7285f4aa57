//! FIT base types and value encoding
//!
//! Every field in a FIT message has one of a fixed set of base types. Values
//! are carried as [`FitValue`], a closed union over that catalog, so a value
//! always knows its own wire type. Loosely typed input ([`FieldValue`]) is
//! converted into the expected type when a data message is constructed.

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::EncodeError;

/// Byte order of multi-byte values in a FIT file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    /// Architecture byte written into definition messages
    pub fn arch_byte(&self) -> u8 {
        match self {
            Endianness::Little => 0,
            Endianness::Big => 1,
        }
    }

    pub fn u16_bytes(&self, value: u16) -> [u8; 2] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }
}

impl TryFrom<u8> for Endianness {
    type Error = EncodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Endianness::Little),
            1 => Ok(Endianness::Big),
            other => Err(EncodeError::UnknownEndianness(other.to_string())),
        }
    }
}

impl FromStr for Endianness {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "little" | "le" => Ok(Endianness::Little),
            "big" | "be" => Ok(Endianness::Big),
            other => Err(EncodeError::UnknownEndianness(other.to_string())),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}

/// FIT base type catalog, discriminants are the wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FitBaseType {
    Enum = 0x00,
    Sint8 = 0x01,
    Uint8 = 0x02,
    Sint16 = 0x83,
    Uint16 = 0x84,
    Sint32 = 0x85,
    Uint32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    Byte = 0x0D,
    Sint64 = 0x8E,
    Uint64 = 0x8F,
}

impl FitBaseType {
    pub const ALL: [FitBaseType; 13] = [
        FitBaseType::Enum,
        FitBaseType::Sint8,
        FitBaseType::Uint8,
        FitBaseType::Sint16,
        FitBaseType::Uint16,
        FitBaseType::Sint32,
        FitBaseType::Uint32,
        FitBaseType::String,
        FitBaseType::Float32,
        FitBaseType::Float64,
        FitBaseType::Byte,
        FitBaseType::Sint64,
        FitBaseType::Uint64,
    ];

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Wire size in bytes; strings have none
    pub fn canonical_size(&self) -> Option<u8> {
        match self {
            FitBaseType::Enum | FitBaseType::Sint8 | FitBaseType::Uint8 | FitBaseType::Byte => Some(1),
            FitBaseType::Sint16 | FitBaseType::Uint16 => Some(2),
            FitBaseType::Sint32 | FitBaseType::Uint32 | FitBaseType::Float32 => Some(4),
            FitBaseType::Sint64 | FitBaseType::Uint64 | FitBaseType::Float64 => Some(8),
            FitBaseType::String => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FitBaseType::Enum => "enum",
            FitBaseType::Sint8 => "sint8",
            FitBaseType::Uint8 => "uint8",
            FitBaseType::Sint16 => "sint16",
            FitBaseType::Uint16 => "uint16",
            FitBaseType::Sint32 => "sint32",
            FitBaseType::Uint32 => "uint32",
            FitBaseType::String => "string",
            FitBaseType::Float32 => "float32",
            FitBaseType::Float64 => "float64",
            FitBaseType::Byte => "byte",
            FitBaseType::Sint64 => "sint64",
            FitBaseType::Uint64 => "uint64",
        }
    }

    /// Check that `value` carries this base type's tag
    pub fn validate_value(&self, value: &FitValue) -> Result<(), EncodeError> {
        if value.base_type() == *self {
            Ok(())
        } else {
            Err(EncodeError::TypeMismatch {
                expected: *self,
                found: value.base_type().name().to_string(),
            })
        }
    }
}

impl TryFrom<u8> for FitBaseType {
    type Error = EncodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        FitBaseType::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(EncodeError::UnknownBaseType(code))
    }
}

impl fmt::Display for FitBaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value tagged with its FIT base type
#[derive(Debug, Clone, PartialEq)]
pub enum FitValue {
    Enum(u8),
    Sint8(i8),
    Uint8(u8),
    Sint16(i16),
    Uint16(u16),
    Sint32(i32),
    Uint32(u32),
    String(String),
    Float32(f32),
    Float64(f64),
    Byte(u8),
    Sint64(i64),
    Uint64(u64),
}

macro_rules! ordered_bytes {
    ($value:expr, $endianness:expr) => {
        match $endianness {
            Endianness::Little => $value.to_le_bytes(),
            Endianness::Big => $value.to_be_bytes(),
        }
    };
}

impl FitValue {
    pub fn base_type(&self) -> FitBaseType {
        match self {
            FitValue::Enum(_) => FitBaseType::Enum,
            FitValue::Sint8(_) => FitBaseType::Sint8,
            FitValue::Uint8(_) => FitBaseType::Uint8,
            FitValue::Sint16(_) => FitBaseType::Sint16,
            FitValue::Uint16(_) => FitBaseType::Uint16,
            FitValue::Sint32(_) => FitBaseType::Sint32,
            FitValue::Uint32(_) => FitBaseType::Uint32,
            FitValue::String(_) => FitBaseType::String,
            FitValue::Float32(_) => FitBaseType::Float32,
            FitValue::Float64(_) => FitBaseType::Float64,
            FitValue::Byte(_) => FitBaseType::Byte,
            FitValue::Sint64(_) => FitBaseType::Sint64,
            FitValue::Uint64(_) => FitBaseType::Uint64,
        }
    }

    /// Write the value in `endianness`
    ///
    /// `size` only matters for strings, which are zero-padded to it and must
    /// leave room for the terminating zero.
    pub fn encode<W: Write>(&self, w: &mut W, endianness: Endianness, size: u8) -> Result<(), EncodeError> {
        match self {
            FitValue::Enum(v) | FitValue::Uint8(v) | FitValue::Byte(v) => w.write_all(&[*v])?,
            FitValue::Sint8(v) => w.write_all(&v.to_le_bytes())?,
            FitValue::Sint16(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Uint16(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Sint32(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Uint32(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Float32(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Float64(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Sint64(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::Uint64(v) => w.write_all(&ordered_bytes!(v, endianness))?,
            FitValue::String(s) => encode_string(w, s, size)?,
        }
        Ok(())
    }
}

fn encode_string<W: Write>(w: &mut W, value: &str, size: u8) -> Result<(), EncodeError> {
    let bytes = value.as_bytes();
    let required = bytes.len() + 1;
    if (size as usize) < required {
        return Err(EncodeError::StringSizeTooSmall {
            declared: size,
            required,
        });
    }
    w.write_all(bytes)?;
    w.write_all(&vec![0u8; size as usize - bytes.len()])?;
    Ok(())
}

/// Loosely typed field input
///
/// Integers, floats and text are converted into the definition's base type
/// when a data message is built; values that don't fit are a
/// [`EncodeError::TypeMismatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Typed(FitValue),
    Int(i128),
    Float(f64),
    Text(String),
}

impl FieldValue {
    fn kind(&self) -> String {
        match self {
            FieldValue::Typed(v) => v.base_type().name().to_string(),
            FieldValue::Int(v) => format!("integer {}", v),
            FieldValue::Float(v) => format!("float {}", v),
            FieldValue::Text(_) => "text".to_string(),
        }
    }

    /// Convert into a value of `base_type`
    pub fn coerce(self, base_type: FitBaseType) -> Result<FitValue, EncodeError> {
        let mismatch = |value: &FieldValue| EncodeError::TypeMismatch {
            expected: base_type,
            found: value.kind(),
        };

        match self {
            FieldValue::Typed(value) => {
                base_type.validate_value(&value)?;
                Ok(value)
            }
            FieldValue::Int(v) => {
                let converted = match base_type {
                    FitBaseType::Enum => u8::try_from(v).ok().map(FitValue::Enum),
                    FitBaseType::Byte => u8::try_from(v).ok().map(FitValue::Byte),
                    FitBaseType::Uint8 => u8::try_from(v).ok().map(FitValue::Uint8),
                    FitBaseType::Sint8 => i8::try_from(v).ok().map(FitValue::Sint8),
                    FitBaseType::Uint16 => u16::try_from(v).ok().map(FitValue::Uint16),
                    FitBaseType::Sint16 => i16::try_from(v).ok().map(FitValue::Sint16),
                    FitBaseType::Uint32 => u32::try_from(v).ok().map(FitValue::Uint32),
                    FitBaseType::Sint32 => i32::try_from(v).ok().map(FitValue::Sint32),
                    FitBaseType::Uint64 => u64::try_from(v).ok().map(FitValue::Uint64),
                    FitBaseType::Sint64 => i64::try_from(v).ok().map(FitValue::Sint64),
                    FitBaseType::Float32 => Some(FitValue::Float32(v as f32)),
                    FitBaseType::Float64 => Some(FitValue::Float64(v as f64)),
                    FitBaseType::String => None,
                };
                converted.ok_or_else(|| mismatch(&FieldValue::Int(v)))
            }
            FieldValue::Float(v) => match base_type {
                FitBaseType::Float32 => Ok(FitValue::Float32(v as f32)),
                FitBaseType::Float64 => Ok(FitValue::Float64(v)),
                _ => Err(mismatch(&FieldValue::Float(v))),
            },
            FieldValue::Text(s) => match base_type {
                FitBaseType::String => Ok(FitValue::String(s)),
                _ => Err(mismatch(&FieldValue::Text(s))),
            },
        }
    }
}

impl From<FitValue> for FieldValue {
    fn from(value: FitValue) -> Self {
        FieldValue::Typed(value)
    }
}

macro_rules! int_field_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Int(value as i128)
                }
            }
        )*
    };
}

int_field_value!(u8, i8, u16, i16, u32, i32, u64, i64, usize);

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Int(value as i128)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}
