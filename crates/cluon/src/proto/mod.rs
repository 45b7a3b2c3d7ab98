// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proto-style binary wire codec.
//!
//! Every non-default field is written as a varint key
//! `(identifier << 3) | wire type` followed by its payload:
//!
//! | Field type                  | Wire type | Payload                         |
//! |-----------------------------|-----------|---------------------------------|
//! | bool, char, (u)int8..64     | 0         | varint (zig-zag when signed)    |
//! | double                      | 1         | 8 bytes little-endian           |
//! | string, bytes, message      | 2         | varint length + bytes           |
//! | float                       | 5         | 4 bytes little-endian           |
//!
//! A `char` above U+00FF has no one-byte form and is skipped by the
//! encoder. Fields holding their zero value are omitted, so a default message
//! encodes to nothing. Decoding tolerates unknown fields, any field order
//! and truncated input.
//!
//! # Example
//!
//! ```rust
//! use cluon::{GenericMessage, MessageParser, FieldValue};
//!
//! let (schema, _) = MessageParser::new()
//!     .parse("message T [id = 5] { uint8 a [id = 1]; string b [id = 2]; }");
//! let mut msg = GenericMessage::create_from_schema(&schema[0], &schema);
//! assert!(cluon::proto::encode(&mut msg).is_empty());
//!
//! msg.set_value(1, FieldValue::Uint8(7)).unwrap();
//! let bytes = cluon::proto::encode(&mut msg);
//! assert_eq!(bytes, vec![0x08, 0x07]);
//! ```

mod cursor;
mod decoder;
mod encoder;
pub mod varint;

pub use cursor::Cursor;
pub use decoder::{DecodeDiagnostics, FromProtoVisitor, WireValue};
pub use encoder::ToProtoVisitor;

use crate::schema::DataType;
use crate::visitor::{Decoder, Visitable};
use std::fmt;

/// Wire types used by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    EightBytes = 1,
    LengthDelimited = 2,
    FourBytes = 5,
}

impl WireType {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Varint),
            1 => Some(Self::EightBytes),
            2 => Some(Self::LengthDelimited),
            5 => Some(Self::FourBytes),
            _ => None,
        }
    }

    /// Wire type a field of `data_type` is written with.
    pub fn for_data_type(data_type: DataType) -> Option<Self> {
        match data_type {
            DataType::Bool
            | DataType::Char
            | DataType::Int8
            | DataType::Uint8
            | DataType::Int16
            | DataType::Uint16
            | DataType::Int32
            | DataType::Uint32
            | DataType::Int64
            | DataType::Uint64 => Some(Self::Varint),
            DataType::Float => Some(Self::FourBytes),
            DataType::Double => Some(Self::EightBytes),
            DataType::String | DataType::Bytes | DataType::Message => Some(Self::LengthDelimited),
            DataType::Undefined => None,
        }
    }
}

/// Errors raised while scanning wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    ReadFailed {
        offset: usize,
        reason: String,
    },
    VarintOverflow {
        offset: usize,
    },
    UnknownWireType {
        offset: usize,
        wire_type: u8,
    },
    LengthOverflow {
        offset: usize,
        length: u64,
        remaining: usize,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { offset, reason } => {
                write!(f, "read failed at offset {}: {}", offset, reason)
            }
            Self::VarintOverflow { offset } => {
                write!(f, "varint at offset {} exceeds 10 bytes", offset)
            }
            Self::UnknownWireType { offset, wire_type } => {
                write!(f, "unknown wire type {} at offset {}", wire_type, offset)
            }
            Self::LengthOverflow {
                offset,
                length,
                remaining,
            } => write!(
                f,
                "length prefix {} at offset {} exceeds remaining {} bytes",
                length, offset, remaining
            ),
        }
    }
}

impl std::error::Error for WireError {}

pub type WireResult<T> = core::result::Result<T, WireError>;

/// Encode any visitable message.
pub fn encode<M: Visitable>(message: &mut M) -> Vec<u8> {
    let mut encoder = ToProtoVisitor::new();
    message.accept(&mut encoder);
    encoder.into_encoded_data()
}

/// Decode `data` into `message`, overwriting the fields present on the wire.
pub fn decode_into<M: Visitable>(data: &[u8], message: &mut M) -> DecodeDiagnostics {
    let mut decoder = FromProtoVisitor::new();
    decoder.decode_from(data);
    message.accept(&mut decoder);
    decoder.diagnostics()
}
