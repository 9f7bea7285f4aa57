//! Definition and data messages
//!
//! A [`MessageDefinition`] describes the layout of a global message. Binding it
//! to a local type gives a [`LocalDefinition`], the only thing a
//! [`DataMessage`] can be constructed from, so every data message carries the
//! exact layout it will be encoded with.

use std::io::Write;
use std::sync::Arc;

use super::developer::DevFieldDefinition;
use super::field::{self, FieldDefinition};
use super::types::{Endianness, FieldValue, FitValue};
use crate::error::EncodeError;

/// Highest local message type a header can address
pub const MAX_LOCAL_TYPE: u8 = 15;

/// Anything that can be written into a FIT stream
pub trait Encode {
    fn encode<W: Write>(&self, w: &mut W, endianness: Endianness) -> Result<(), EncodeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    Data,
    Definition,
}

/// Normal (non-compressed) record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub class: MessageClass,
    pub developer_data: bool,
    pub local_type: u8,
}

impl MessageHeader {
    pub fn definition(local_type: u8, developer_data: bool) -> Self {
        Self {
            class: MessageClass::Definition,
            developer_data,
            local_type,
        }
    }

    pub fn data(local_type: u8) -> Self {
        Self {
            class: MessageClass::Data,
            developer_data: false,
            local_type,
        }
    }

    pub fn to_byte(&self) -> Result<u8, EncodeError> {
        if self.local_type > MAX_LOCAL_TYPE {
            return Err(EncodeError::LocalTypeOverflow(self.local_type));
        }
        let mut byte = self.local_type;
        match self.class {
            MessageClass::Definition => {
                byte |= 0x40;
                if self.developer_data {
                    byte |= 0x20;
                }
            }
            MessageClass::Data => {
                if self.developer_data {
                    return Err(EncodeError::MsgSpecificMisuse);
                }
            }
        }
        Ok(byte)
    }
}

impl Encode for MessageHeader {
    fn encode<W: Write>(&self, w: &mut W, _endianness: Endianness) -> Result<(), EncodeError> {
        w.write_all(&[self.to_byte()?])?;
        Ok(())
    }
}

/// Layout of a global message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    pub global_number: u16,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DevFieldDefinition>,
}

impl MessageDefinition {
    pub fn new(global_number: u16, fields: Vec<FieldDefinition>) -> Self {
        Self {
            global_number,
            fields,
            developer_fields: Vec::new(),
        }
    }

    pub fn with_developer_fields(mut self, developer_fields: Vec<DevFieldDefinition>) -> Self {
        self.developer_fields = developer_fields;
        self
    }

    /// Number of values a data message for this definition takes
    pub fn value_count(&self) -> usize {
        self.fields.len() + self.developer_fields.len()
    }

    /// Bind the definition to a local message type
    pub fn bind(self, local_type: u8) -> LocalDefinition {
        LocalDefinition {
            local_type,
            definition: Arc::new(self),
        }
    }
}

/// A definition bound to a local message type
#[derive(Debug, Clone)]
pub struct LocalDefinition {
    local_type: u8,
    definition: Arc<MessageDefinition>,
}

impl LocalDefinition {
    pub fn local_type(&self) -> u8 {
        self.local_type
    }

    pub fn definition(&self) -> &MessageDefinition {
        &self.definition
    }

    /// Whether both bindings share the same definition instance
    pub fn same_binding(&self, other: &LocalDefinition) -> bool {
        self.local_type == other.local_type && Arc::ptr_eq(&self.definition, &other.definition)
    }

    fn header(&self) -> MessageHeader {
        MessageHeader::definition(self.local_type, !self.definition.developer_fields.is_empty())
    }

    /// Build a data message from positional values
    ///
    /// Values follow the standard fields in declared order, then the
    /// developer fields.
    pub fn construct_data(&self, values: Vec<FieldValue>) -> Result<DataMessage, EncodeError> {
        let expected = self.definition.value_count();
        if values.len() != expected {
            return Err(EncodeError::ArityMismatch {
                expected,
                found: values.len(),
            });
        }

        let base_types = self
            .definition
            .fields
            .iter()
            .map(|f| f.base_type)
            .chain(self.definition.developer_fields.iter().map(|f| f.base_type));

        let values = values
            .into_iter()
            .zip(base_types)
            .map(|(value, base_type)| value.coerce(base_type))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DataMessage {
            definition: self.clone(),
            values,
        })
    }
}

impl PartialEq for LocalDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.local_type == other.local_type && self.definition == other.definition
    }
}

impl Encode for LocalDefinition {
    fn encode<W: Write>(&self, w: &mut W, endianness: Endianness) -> Result<(), EncodeError> {
        let definition = &self.definition;
        let mut buf = Vec::with_capacity(6 + 3 * definition.value_count());

        buf.push(self.header().to_byte()?);
        buf.push(0);
        buf.push(endianness.arch_byte());
        buf.extend_from_slice(&endianness.u16_bytes(definition.global_number));
        buf.push(definition.fields.len() as u8);
        for field in &definition.fields {
            field.encode_definition(&mut buf)?;
        }

        if !definition.developer_fields.is_empty() {
            buf.push(definition.developer_fields.len() as u8);
            for field in &definition.developer_fields {
                field.encode_definition(&mut buf)?;
            }
        }

        w.write_all(&buf)?;
        Ok(())
    }
}

/// Values for one instance of a local definition
#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    definition: LocalDefinition,
    values: Vec<FitValue>,
}

impl DataMessage {
    pub fn local_definition(&self) -> &LocalDefinition {
        &self.definition
    }

    pub fn values(&self) -> &[FitValue] {
        &self.values
    }
}

impl Encode for DataMessage {
    fn encode<W: Write>(&self, w: &mut W, endianness: Endianness) -> Result<(), EncodeError> {
        let definition = self.definition.definition();
        let mut buf = Vec::new();

        buf.push(MessageHeader::data(self.definition.local_type).to_byte()?);

        let layouts = definition
            .fields
            .iter()
            .map(|f| (f.base_type, f.size))
            .chain(definition.developer_fields.iter().map(|f| (f.base_type, f.size)));
        for ((base_type, size), value) in layouts.zip(&self.values) {
            field::encode_value(base_type, size, &mut buf, value, endianness)?;
        }

        w.write_all(&buf)?;
        Ok(())
    }
}

/// Anything a FIT file body is made of
#[derive(Debug, Clone, PartialEq)]
pub enum FitMessage {
    Definition(LocalDefinition),
    Data(DataMessage),
}

impl FitMessage {
    pub fn local_type(&self) -> u8 {
        match self {
            FitMessage::Definition(d) => d.local_type(),
            FitMessage::Data(d) => d.local_definition().local_type(),
        }
    }
}

impl From<LocalDefinition> for FitMessage {
    fn from(definition: LocalDefinition) -> Self {
        FitMessage::Definition(definition)
    }
}

impl From<DataMessage> for FitMessage {
    fn from(data: DataMessage) -> Self {
        FitMessage::Data(data)
    }
}

impl Encode for FitMessage {
    fn encode<W: Write>(&self, w: &mut W, endianness: Endianness) -> Result<(), EncodeError> {
        match self {
            FitMessage::Definition(d) => d.encode(w, endianness),
            FitMessage::Data(d) => d.encode(w, endianness),
        }
    }
}

/// Build a `Vec<FieldValue>` from mixed values
#[macro_export]
macro_rules! fit_values {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::fit::types::FieldValue::from($value)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::types::FitBaseType;

    fn file_id_definition() -> LocalDefinition {
        MessageDefinition::new(
            0,
            vec![
                FieldDefinition::of(1, FitBaseType::Uint16),
                FieldDefinition::of(2, FitBaseType::Uint16),
                FieldDefinition::of(0, FitBaseType::Enum),
                FieldDefinition::of(4, FitBaseType::Uint32),
            ],
        )
        .bind(0)
    }

    fn encode<E: Encode>(message: &E, endianness: Endianness) -> Vec<u8> {
        let mut buf = Vec::new();
        message.encode(&mut buf, endianness).unwrap();
        buf
    }

    #[test]
    fn test_header_bits() {
        assert_eq!(MessageHeader::definition(0, false).to_byte().unwrap(), 0x40);
        assert_eq!(MessageHeader::definition(3, true).to_byte().unwrap(), 0x63);
        assert_eq!(MessageHeader::data(15).to_byte().unwrap(), 0x0F);
        assert!(matches!(
            MessageHeader::data(16).to_byte(),
            Err(EncodeError::LocalTypeOverflow(16))
        ));

        let misuse = MessageHeader {
            class: MessageClass::Data,
            developer_data: true,
            local_type: 0,
        };
        assert!(matches!(misuse.to_byte(), Err(EncodeError::MsgSpecificMisuse)));
    }

    #[test]
    fn test_definition_layout_big_endian() {
        assert_eq!(
            encode(&file_id_definition(), Endianness::Big),
            vec![
                0x40, 0x00, 0x01, 0x00, 0x00, 0x04, 0x01, 0x02, 0x84, 0x02, 0x02, 0x84, 0x00, 0x01,
                0x00, 0x04, 0x04, 0x86
            ]
        );
    }

    #[test]
    fn test_definition_layout_little_endian() {
        let definition = MessageDefinition::new(207, vec![FieldDefinition::of(3, FitBaseType::Uint8)]).bind(2);
        assert_eq!(
            encode(&definition, Endianness::Little),
            vec![0x42, 0x00, 0x00, 0xCF, 0x00, 0x01, 0x03, 0x01, 0x02]
        );
    }

    #[test]
    fn test_data_layout() {
        let data = file_id_definition()
            .construct_data(crate::fit_values![265u16, 102u16, 4u8, 1007562558u32])
            .unwrap();
        assert_eq!(
            encode(&data, Endianness::Big),
            vec![0x00, 0x01, 0x09, 0x00, 0x66, 0x04, 0x3C, 0x0E, 0x2F, 0x3E]
        );
    }

    #[test]
    fn test_arity_checked() {
        let definition = file_id_definition();
        for count in [0usize, 3, 5] {
            let values = (0..count).map(|_| FieldValue::from(1u8)).collect();
            assert!(matches!(
                definition.construct_data(values),
                Err(EncodeError::ArityMismatch { expected: 4, found }) if found == count
            ));
        }
    }

    #[test]
    fn test_incompatible_value_rejected() {
        let err = file_id_definition()
            .construct_data(crate::fit_values![265u16, "102", 4u8, 1u32])
            .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::TypeMismatch {
                expected: FitBaseType::Uint16,
                ..
            }
        ));
    }

    #[test]
    fn test_overflowing_local_type_fails_on_encode() {
        let definition = MessageDefinition::new(0, vec![]).bind(16);
        let mut buf = Vec::new();
        assert!(matches!(
            definition.encode(&mut buf, Endianness::Little),
            Err(EncodeError::LocalTypeOverflow(16))
        ));
    }
}
