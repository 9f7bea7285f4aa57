//! Developer fields
//!
//! Fields outside the standard profile are announced once per file by a
//! developer-data-id message and one field-description message per field.
//! [`DeveloperData`] keeps the registered fields in insertion order and emits
//! that preamble.

use std::io::Write;

use super::field::{self, FieldDefinition};
use super::message::{FitMessage, MessageDefinition};
use super::profile::{
    DEVELOPER_DATA_ID_MESG_NUM, DEV_APPLICATION_VERSION, DEV_DEVELOPER_DATA_INDEX,
    FIELD_DESCRIPTION_MESG_NUM, FIELD_DESC_BASE_TYPE, FIELD_DESC_DEVELOPER_DATA_INDEX,
    FIELD_DESC_FIELD_DEFINITION_NUMBER, FIELD_DESC_FIELD_NAME,
};
use super::types::{FieldValue, FitBaseType};
use crate::error::EncodeError;

/// Developer application registered in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperDataId {
    pub index: u8,
    pub app_version: u32,
}

/// Description of one developer field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub developer_data_index: u8,
    pub field_number: u8,
    pub base_type: FitBaseType,
    pub name: String,
}

/// A developer field inside a definition message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevFieldDefinition {
    number: u8,
    pub size: u8,
    developer_data_index: u8,
    pub base_type: FitBaseType,
}

impl DevFieldDefinition {
    /// Pair a field description with its developer
    ///
    /// Fails when the description belongs to another developer data index.
    pub fn new(
        developer: &DeveloperDataId,
        description: &FieldDescription,
        size: u8,
    ) -> Result<Self, EncodeError> {
        if developer.index != description.developer_data_index {
            return Err(EncodeError::DevDataIndexMismatch {
                definition: developer.index,
                description: description.developer_data_index,
            });
        }
        Ok(Self {
            number: description.field_number,
            size,
            developer_data_index: developer.index,
            base_type: description.base_type,
        })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn developer_data_index(&self) -> u8 {
        self.developer_data_index
    }

    /// Write the (number, size, developer data index) triple
    pub fn encode_definition<W: Write>(&self, w: &mut W) -> Result<(), EncodeError> {
        field::validate_size(self.base_type, self.size)?;
        w.write_all(&[self.number, self.size, self.developer_data_index])?;
        Ok(())
    }
}

/// Registry of developer fields for one developer data index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperData {
    developer: DeveloperDataId,
    fields: Vec<FieldDescription>,
}

impl DeveloperData {
    pub fn new(index: u8, app_version: u32) -> Self {
        Self {
            developer: DeveloperDataId { index, app_version },
            fields: Vec::new(),
        }
    }

    pub fn developer(&self) -> &DeveloperDataId {
        &self.developer
    }

    pub fn fields(&self) -> &[FieldDescription] {
        &self.fields
    }

    /// Register a field, numbered in insertion order
    ///
    /// Registering a known name returns its existing number.
    pub fn add_field(&mut self, name: &str, base_type: FitBaseType) -> u8 {
        if let Some(existing) = self.description(name) {
            return existing.field_number;
        }
        let field_number = self.fields.len() as u8;
        self.fields.push(FieldDescription {
            developer_data_index: self.developer.index,
            field_number,
            base_type,
            name: name.to_string(),
        });
        field_number
    }

    pub fn description(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Definition entry for a registered field
    ///
    /// Fixed-size types ignore `size`; strings need room for the terminating zero.
    pub fn field(&self, name: &str, size: u8) -> Result<DevFieldDefinition, EncodeError> {
        let description = self
            .description(name)
            .ok_or_else(|| EncodeError::UnknownDeveloperField(name.to_string()))?;
        let size = description.base_type.canonical_size().unwrap_or(size);
        DevFieldDefinition::new(&self.developer, description, size)
    }

    /// Definition entry for a string field sized to fit `value`
    pub fn string_field(&self, name: &str, value: &str) -> Result<DevFieldDefinition, EncodeError> {
        let size = u8::try_from(value.len() + 1).map_err(|_| EncodeError::StringSizeTooSmall {
            declared: u8::MAX,
            required: value.len() + 1,
        })?;
        self.field(name, size)
    }

    /// Developer-data-id and field-description messages, all on `local_type`
    pub fn preamble(&self, local_type: u8) -> Result<Vec<FitMessage>, EncodeError> {
        let mut messages = Vec::with_capacity(3 + self.fields.len());

        let id_definition = MessageDefinition::new(
            DEVELOPER_DATA_ID_MESG_NUM,
            vec![
                FieldDefinition::of(DEV_DEVELOPER_DATA_INDEX, FitBaseType::Uint8),
                FieldDefinition::of(DEV_APPLICATION_VERSION, FitBaseType::Uint32),
            ],
        )
        .bind(local_type);
        let id = id_definition.construct_data(crate::fit_values![
            self.developer.index,
            self.developer.app_version
        ])?;
        messages.push(id_definition.into());
        messages.push(id.into());

        if self.fields.is_empty() {
            return Ok(messages);
        }

        let longest_name = self.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        let name_size = u8::try_from(longest_name + 1).map_err(|_| EncodeError::StringSizeTooSmall {
            declared: u8::MAX,
            required: longest_name + 1,
        })?;

        let description_definition = MessageDefinition::new(
            FIELD_DESCRIPTION_MESG_NUM,
            vec![
                FieldDefinition::of(FIELD_DESC_DEVELOPER_DATA_INDEX, FitBaseType::Uint8),
                FieldDefinition::of(FIELD_DESC_FIELD_DEFINITION_NUMBER, FitBaseType::Uint8),
                FieldDefinition::of(FIELD_DESC_BASE_TYPE, FitBaseType::Uint8),
                FieldDefinition::string(FIELD_DESC_FIELD_NAME, name_size),
            ],
        )
        .bind(local_type);
        messages.push(description_definition.clone().into());

        for description in &self.fields {
            let values: Vec<FieldValue> = crate::fit_values![
                description.developer_data_index,
                description.field_number,
                description.base_type.code(),
                description.name.as_str(),
            ];
            messages.push(description_definition.construct_data(values)?.into());
        }

        Ok(messages)
    }
}
