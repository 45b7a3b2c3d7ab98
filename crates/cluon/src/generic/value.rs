// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field values held by a [`GenericMessage`].

use super::GenericMessage;
use crate::schema::DataType;
use crate::visitor::FieldMut;

/// A value of any field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Char(char),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Message(Box<GenericMessage>),
}

impl FieldValue {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Char(_) => DataType::Char,
            Self::Int8(_) => DataType::Int8,
            Self::Uint8(_) => DataType::Uint8,
            Self::Int16(_) => DataType::Int16,
            Self::Uint16(_) => DataType::Uint16,
            Self::Int32(_) => DataType::Int32,
            Self::Uint32(_) => DataType::Uint32,
            Self::Int64(_) => DataType::Int64,
            Self::Uint64(_) => DataType::Uint64,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
            Self::Bytes(_) => DataType::Bytes,
            Self::Message(_) => DataType::Message,
        }
    }

    /// Zero value of a primitive type; `None` for messages.
    // @audit-ok: Simple pattern matching - default value dispatch table
    pub fn default_for(data_type: DataType) -> Option<Self> {
        let value = match data_type {
            DataType::Bool => Self::Bool(false),
            DataType::Char => Self::Char('\0'),
            DataType::Int8 => Self::Int8(0),
            DataType::Uint8 => Self::Uint8(0),
            DataType::Int16 => Self::Int16(0),
            DataType::Uint16 => Self::Uint16(0),
            DataType::Int32 => Self::Int32(0),
            DataType::Uint32 => Self::Uint32(0),
            DataType::Int64 => Self::Int64(0),
            DataType::Uint64 => Self::Uint64(0),
            DataType::Float => Self::Float(0.0),
            DataType::Double => Self::Double(0.0),
            DataType::String => Self::String(String::new()),
            DataType::Bytes => Self::Bytes(Vec::new()),
            DataType::Message | DataType::Undefined => return None,
        };
        Some(value)
    }

    /// Mutable view for visitors; `None` for nested messages.
    pub fn as_field_mut(&mut self) -> Option<FieldMut<'_>> {
        let field = match self {
            Self::Bool(v) => FieldMut::Bool(v),
            Self::Char(v) => FieldMut::Char(v),
            Self::Int8(v) => FieldMut::Int8(v),
            Self::Uint8(v) => FieldMut::Uint8(v),
            Self::Int16(v) => FieldMut::Int16(v),
            Self::Uint16(v) => FieldMut::Uint16(v),
            Self::Int32(v) => FieldMut::Int32(v),
            Self::Uint32(v) => FieldMut::Uint32(v),
            Self::Int64(v) => FieldMut::Int64(v),
            Self::Uint64(v) => FieldMut::Uint64(v),
            Self::Float(v) => FieldMut::Float(v),
            Self::Double(v) => FieldMut::Double(v),
            Self::String(v) => FieldMut::String(v),
            Self::Bytes(v) => FieldMut::Bytes(v),
            Self::Message(_) => return None,
        };
        Some(field)
    }

    /// Copy this value into `target` when the types agree.
    ///
    /// Returns `false` and leaves `target` untouched otherwise.
    pub fn copy_into(&self, target: FieldMut<'_>) -> bool {
        match (self, target) {
            (Self::Bool(v), FieldMut::Bool(t)) => *t = *v,
            (Self::Char(v), FieldMut::Char(t)) => *t = *v,
            (Self::Int8(v), FieldMut::Int8(t)) => *t = *v,
            (Self::Uint8(v), FieldMut::Uint8(t)) => *t = *v,
            (Self::Int16(v), FieldMut::Int16(t)) => *t = *v,
            (Self::Uint16(v), FieldMut::Uint16(t)) => *t = *v,
            (Self::Int32(v), FieldMut::Int32(t)) => *t = *v,
            (Self::Uint32(v), FieldMut::Uint32(t)) => *t = *v,
            (Self::Int64(v), FieldMut::Int64(t)) => *t = *v,
            (Self::Uint64(v), FieldMut::Uint64(t)) => *t = *v,
            (Self::Float(v), FieldMut::Float(t)) => *t = *v,
            (Self::Double(v), FieldMut::Double(t)) => *t = *v,
            (Self::String(v), FieldMut::String(t)) => t.clone_from(v),
            (Self::Bytes(v), FieldMut::Bytes(t)) => t.clone_from(v),
            _ => return false,
        }
        true
    }

    /// Try to get as nested message.
    pub fn as_message(&self) -> Option<&GenericMessage> {
        match self {
            Self::Message(v) => Some(&**v),
            _ => None,
        }
    }

    /// Try to get as mutable nested message.
    pub fn as_message_mut(&mut self) -> Option<&mut GenericMessage> {
        match self {
            Self::Message(v) => Some(&mut **v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl From<FieldMut<'_>> for FieldValue {
    fn from(field: FieldMut<'_>) -> Self {
        match field {
            FieldMut::Bool(v) => Self::Bool(*v),
            FieldMut::Char(v) => Self::Char(*v),
            FieldMut::Int8(v) => Self::Int8(*v),
            FieldMut::Uint8(v) => Self::Uint8(*v),
            FieldMut::Int16(v) => Self::Int16(*v),
            FieldMut::Uint16(v) => Self::Uint16(*v),
            FieldMut::Int32(v) => Self::Int32(*v),
            FieldMut::Uint32(v) => Self::Uint32(*v),
            FieldMut::Int64(v) => Self::Int64(*v),
            FieldMut::Uint64(v) => Self::Uint64(*v),
            FieldMut::Float(v) => Self::Float(*v),
            FieldMut::Double(v) => Self::Double(*v),
            FieldMut::String(v) => Self::String(v.clone()),
            FieldMut::Bytes(v) => Self::Bytes(v.clone()),
        }
    }
}

/// Read a typed value out of a [`FieldValue`].
pub trait FromFieldValue: Sized {
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

/// Generate `From<T>` and [`FromFieldValue`] for one scalar variant.
macro_rules! impl_field_value {
    ($ty:ty, $variant:ident, $getter:ident) => {
        impl From<$ty> for FieldValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }

        impl FromFieldValue for $ty {
            fn from_field_value(value: &FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }

        impl FieldValue {
            pub fn $getter(&self) -> Option<$ty> {
                <$ty>::from_field_value(self)
            }
        }
    };
}

impl_field_value!(bool, Bool, as_bool);
impl_field_value!(char, Char, as_char);
impl_field_value!(i8, Int8, as_i8);
impl_field_value!(u8, Uint8, as_u8);
impl_field_value!(i16, Int16, as_i16);
impl_field_value!(u16, Uint16, as_u16);
impl_field_value!(i32, Int32, as_i32);
impl_field_value!(u32, Uint32, as_u32);
impl_field_value!(i64, Int64, as_i64);
impl_field_value!(u64, Uint64, as_u64);
impl_field_value!(f32, Float, as_f32);
impl_field_value!(f64, Double, as_f64);

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<GenericMessage> for FieldValue {
    fn from(v: GenericMessage) -> Self {
        Self::Message(Box::new(v))
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromFieldValue for Vec<u8> {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromFieldValue for GenericMessage {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_message().cloned()
    }
}
