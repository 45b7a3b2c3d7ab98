// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema descriptors for runtime message information.

use std::fmt;

/// Field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    Bool,
    Char,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    /// Nested message, resolved through the field's `data_type_name`.
    Message,
    #[default]
    Undefined,
}

impl DataType {
    /// Map a primitive ODVD type token (`uint8`, `string`, ...) to its data type.
    ///
    /// Returns `None` for anything else, which callers treat as a message reference.
    pub fn from_type_token(token: &str) -> Option<Self> {
        let data_type = match token {
            "bool" => Self::Bool,
            "char" => Self::Char,
            "int8" => Self::Int8,
            "uint8" => Self::Uint8,
            "int16" => Self::Int16,
            "uint16" => Self::Uint16,
            "int32" => Self::Int32,
            "uint32" => Self::Uint32,
            "int64" => Self::Int64,
            "uint64" => Self::Uint64,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            _ => return None,
        };
        Some(data_type)
    }

    /// Canonical ODVD token for this type.
    pub fn type_token(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
            Self::Undefined => "undefined",
        }
    }

    /// Check if values of this type are zig-zag encoded on the wire.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Message | Self::Undefined)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_token())
    }
}

/// One field of a message schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaField {
    /// Field type.
    pub data_type: DataType,
    /// Type label; the referenced message name for nested fields.
    pub data_type_name: String,
    /// Field name, unique within the owning message.
    pub name: String,
    /// Numerical field identifier, unique within the owning message.
    pub identifier: u32,
    /// Default literal exactly as written in the specification.
    pub default_value: Option<String>,
}

impl MetaField {
    /// Create a primitive field; the type label is the canonical token.
    pub fn new(data_type: DataType, name: impl Into<String>, identifier: u32) -> Self {
        Self {
            data_type,
            data_type_name: data_type.type_token().to_string(),
            name: name.into(),
            identifier,
            default_value: None,
        }
    }

    /// Create a field referencing another message by name.
    pub fn message(
        data_type_name: impl Into<String>,
        name: impl Into<String>,
        identifier: u32,
    ) -> Self {
        Self {
            data_type: DataType::Message,
            data_type_name: data_type_name.into(),
            name: name.into(),
            identifier,
            default_value: None,
        }
    }

    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default_value = Some(literal.into());
        self
    }

    pub fn with_identifier(mut self, identifier: u32) -> Self {
        self.identifier = identifier;
        self
    }
}

/// Schema of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaMessage {
    /// Dotted namespace prefix, possibly empty.
    pub package_name: String,
    /// Message name, possibly dotted itself.
    pub message_name: String,
    /// Numerical message identifier.
    pub message_identifier: i32,
    fields: Vec<MetaField>,
}

impl MetaMessage {
    /// Create a message schema without fields.
    pub fn new(
        package_name: impl Into<String>,
        message_name: impl Into<String>,
        message_identifier: i32,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            message_name: message_name.into(),
            message_identifier,
            fields: Vec::new(),
        }
    }

    /// Append a field; declaration order is preserved.
    pub fn add(&mut self, field: MetaField) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Builder variant of [`MetaMessage::add`].
    pub fn with_field(mut self, field: MetaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[MetaField] {
        &self.fields
    }

    /// Get field by numerical identifier.
    pub fn field_by_id(&self, identifier: u32) -> Option<&MetaField> {
        self.fields.iter().find(|f| f.identifier == identifier)
    }

    /// Get field by name.
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fully-qualified name: `package.message`, or the message name alone.
    pub fn long_name(&self) -> String {
        if self.package_name.is_empty() {
            self.message_name.clone()
        } else {
            format!("{}.{}", self.package_name, self.message_name)
        }
    }

    /// Last dotted segment of the message name.
    pub fn short_name(&self) -> &str {
        self.message_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.message_name)
    }
}
