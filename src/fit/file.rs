//! FIT file assembly
//!
//! A [`FitFile`] is an ordered list of messages. Encoding writes the 14-byte
//! header, the message body and a trailing CRC of the body.

use std::io::Write;
use tracing::{debug, info};

use super::crc::{self, Crc16};
use super::message::{Encode, FitMessage, LocalDefinition, MAX_LOCAL_TYPE};
use super::types::Endianness;
use crate::error::EncodeError;

pub const HEADER_SIZE: u8 = 14;
pub const PROTOCOL_VERSION: u8 = 0x20;
pub const PROFILE_VERSION: u16 = 2132;
pub const SIGNATURE: [u8; 4] = *b".FIT";

/// Messages of one FIT file in the order they will be written
#[derive(Debug, Clone, PartialEq)]
pub struct FitFile {
    endianness: Endianness,
    messages: Vec<FitMessage>,
    bindings: Vec<Option<LocalDefinition>>,
}

impl FitFile {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            messages: Vec::new(),
            bindings: vec![None; MAX_LOCAL_TYPE as usize + 1],
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn messages(&self) -> &[FitMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message
    ///
    /// A definition (re)binds its local type. A data message must use the
    /// definition currently bound to its local type.
    pub fn add_message(&mut self, message: impl Into<FitMessage>) -> Result<(), EncodeError> {
        let message = message.into();
        let local_type = message.local_type();
        if local_type > MAX_LOCAL_TYPE {
            return Err(EncodeError::LocalTypeOverflow(local_type));
        }
        let slot = &mut self.bindings[local_type as usize];

        match &message {
            FitMessage::Definition(definition) => {
                *slot = Some(definition.clone());
            }
            FitMessage::Data(data) => {
                let bound = slot
                    .as_ref()
                    .map_or(false, |d| d.same_binding(data.local_definition()));
                if !bound {
                    return Err(EncodeError::UndefinedLocalType(local_type));
                }
            }
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn add_messages<I>(&mut self, messages: I) -> Result<(), EncodeError>
    where
        I: IntoIterator,
        I::Item: Into<FitMessage>,
    {
        for message in messages {
            self.add_message(message)?;
        }
        Ok(())
    }

    fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
        let mut body = Vec::new();
        for message in &self.messages {
            message.encode(&mut body, self.endianness)?;
        }
        Ok(body)
    }

    /// Write the whole file, returning the number of bytes written
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        let body = self.encode_body()?;
        let header = file_header(body.len() as u32);

        let mut body_crc = Crc16::new();
        body_crc.update(&body);

        w.write_all(&header)?;
        w.write_all(&body)?;
        w.write_all(&body_crc.sum_bytes())?;

        let total = header.len() + body.len() + 2;
        info!(
            messages = self.messages.len(),
            data_size = body.len(),
            bytes = total,
            endianness = %self.endianness,
            "FIT file encoded"
        );
        Ok(total)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        self.encode(&mut bytes)?;
        Ok(bytes)
    }
}

/// 14-byte header for a body of `data_size` bytes
pub fn file_header(data_size: u32) -> [u8; HEADER_SIZE as usize] {
    let mut header = [0u8; HEADER_SIZE as usize];
    header[0] = HEADER_SIZE;
    header[1] = PROTOCOL_VERSION;
    header[2..4].copy_from_slice(&PROFILE_VERSION.to_le_bytes());
    header[4..8].copy_from_slice(&data_size.to_le_bytes());
    header[8..12].copy_from_slice(&SIGNATURE);
    let crc = crc::checksum(&header[..12]);
    header[12..14].copy_from_slice(&crc.to_le_bytes());
    header
}

/// Integrity summary of an encoded FIT file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitIntegrity {
    pub data_size: u32,
    pub header_crc: u16,
    pub header_crc_valid: bool,
    pub body_crc: u16,
    pub body_crc_valid: bool,
}

impl FitIntegrity {
    pub fn is_valid(&self) -> bool {
        self.header_crc_valid && self.body_crc_valid
    }
}

/// Check header and body CRCs of a 14-byte-header FIT file
///
/// Returns `None` when the bytes don't look like such a file.
pub fn verify(bytes: &[u8]) -> Option<FitIntegrity> {
    let header_len = HEADER_SIZE as usize;
    if bytes.len() < header_len + 2 || bytes[0] != HEADER_SIZE || bytes[8..12] != SIGNATURE {
        return None;
    }

    let data_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let body_end = header_len.checked_add(data_size as usize)?;
    if bytes.len() < body_end + 2 {
        return None;
    }

    let header_crc = u16::from_le_bytes([bytes[12], bytes[13]]);
    let body_crc = u16::from_le_bytes([bytes[body_end], bytes[body_end + 1]]);
    let integrity = FitIntegrity {
        data_size,
        header_crc,
        header_crc_valid: crc::checksum(&bytes[..12]) == header_crc,
        body_crc,
        body_crc_valid: crc::checksum(&bytes[header_len..body_end]) == body_crc,
    };
    debug!(?integrity, "FIT file verified");
    Some(integrity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::field::FieldDefinition;
    use crate::fit::message::MessageDefinition;
    use crate::fit::types::FitBaseType;

    fn file_id() -> LocalDefinition {
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

    #[test]
    fn test_empty_file_layout() {
        let bytes = FitFile::new(Endianness::Little).to_bytes().unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..12], &[0x0E, 0x20, 0x54, 0x08, 0, 0, 0, 0, b'.', b'F', b'I', b'T']);
        assert_eq!(&bytes[14..], &[0, 0]);
        assert!(verify(&bytes).unwrap().is_valid());
    }

    #[test]
    fn test_file_layout_with_messages() {
        let definition = file_id();
        let mut file = FitFile::new(Endianness::Big);
        file.add_message(definition.clone()).unwrap();
        file.add_message(
            definition
                .construct_data(crate::fit_values![265u16, 102u16, 4u8, 1007562558u32])
                .unwrap(),
        )
        .unwrap();

        let bytes = file.to_bytes().unwrap();
        let body = &bytes[14..bytes.len() - 2];
        assert_eq!(body.len(), 18 + 10);
        assert_eq!(&bytes[4..8], &28u32.to_le_bytes());
        assert_eq!(crc::checksum(&bytes[..12]).to_le_bytes(), [bytes[12], bytes[13]]);
        assert_eq!(
            crc::checksum(body).to_le_bytes(),
            [bytes[bytes.len() - 2], bytes[bytes.len() - 1]]
        );

        let integrity = verify(&bytes).unwrap();
        assert_eq!(integrity.data_size, 28);
        assert!(integrity.is_valid());
    }

    #[test]
    fn test_data_before_definition_rejected() {
        let definition = file_id();
        let data = definition
            .construct_data(crate::fit_values![1u16, 2u16, 3u8, 4u32])
            .unwrap();

        let mut file = FitFile::new(Endianness::Little);
        assert!(matches!(
            file.add_message(data.clone()),
            Err(EncodeError::UndefinedLocalType(0))
        ));

        file.add_message(definition).unwrap();
        file.add_message(data.clone()).unwrap();

        // rebinding local type 0 invalidates the old definition's data
        file.add_message(MessageDefinition::new(21, vec![]).bind(0)).unwrap();
        assert!(matches!(
            file.add_message(data),
            Err(EncodeError::UndefinedLocalType(0))
        ));
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn test_verify_detects_corruption() {
        let definition = file_id();
        let mut file = FitFile::new(Endianness::Little);
        file.add_message(definition.clone()).unwrap();
        file.add_message(
            definition
                .construct_data(crate::fit_values![1u16, 2u16, 3u8, 4u32])
                .unwrap(),
        )
        .unwrap();

        let mut bytes = file.to_bytes().unwrap();
        bytes[20] ^= 0xFF;
        let integrity = verify(&bytes).unwrap();
        assert!(integrity.header_crc_valid);
        assert!(!integrity.body_crc_valid);

        assert!(verify(b"not a fit file").is_none());
    }
}
