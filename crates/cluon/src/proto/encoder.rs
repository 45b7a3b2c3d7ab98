// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary encoder.

use super::varint::{
    encode_key, write_varint, zigzag_encode_16, zigzag_encode_32, zigzag_encode_64,
    zigzag_encode_8,
};
use super::WireType;
use crate::visitor::{FieldInfo, FieldMut, Visitable, Visitor};

/// Visitor writing the fields it is shown into a wire buffer.
///
/// A `char` travels as one byte, so only U+0000..=U+00FF can be written;
/// other chars are skipped and counted in
/// [`unencodable_fields`](Self::unencodable_fields).
#[derive(Debug, Default)]
pub struct ToProtoVisitor {
    buffer: Vec<u8>,
    unencodable: usize,
}

impl ToProtoVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn encoded_data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_encoded_data(self) -> Vec<u8> {
        self.buffer
    }

    /// Fields skipped because their value has no wire form.
    pub fn unencodable_fields(&self) -> usize {
        self.unencodable
    }

    fn write_varint_field(&mut self, id: u32, value: u64) {
        write_varint(&mut self.buffer, encode_key(id, WireType::Varint));
        write_varint(&mut self.buffer, value);
    }

    fn write_length_delimited(&mut self, id: u32, bytes: &[u8]) {
        write_varint(&mut self.buffer, encode_key(id, WireType::LengthDelimited));
        write_varint(&mut self.buffer, bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }
}

impl Visitor for ToProtoVisitor {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        if value.is_default() {
            return;
        }
        let id = field.id;
        match value {
            FieldMut::Bool(v) => self.write_varint_field(id, u64::from(*v)),
            FieldMut::Char(v) => match u8::try_from(u32::from(*v)) {
                Ok(byte) => self.write_varint_field(id, u64::from(byte)),
                Err(_) => {
                    self.unencodable += 1;
                    log::trace!(
                        "[proto] field {} '{}' skipped, {:?} is outside Latin-1",
                        id,
                        field.name,
                        v
                    );
                }
            },
            FieldMut::Int8(v) => self.write_varint_field(id, u64::from(zigzag_encode_8(*v))),
            FieldMut::Uint8(v) => self.write_varint_field(id, u64::from(*v)),
            FieldMut::Int16(v) => self.write_varint_field(id, u64::from(zigzag_encode_16(*v))),
            FieldMut::Uint16(v) => self.write_varint_field(id, u64::from(*v)),
            FieldMut::Int32(v) => self.write_varint_field(id, u64::from(zigzag_encode_32(*v))),
            FieldMut::Uint32(v) => self.write_varint_field(id, u64::from(*v)),
            FieldMut::Int64(v) => self.write_varint_field(id, zigzag_encode_64(*v)),
            FieldMut::Uint64(v) => self.write_varint_field(id, *v),
            FieldMut::Float(v) => {
                write_varint(&mut self.buffer, encode_key(id, WireType::FourBytes));
                self.buffer.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            FieldMut::Double(v) => {
                write_varint(&mut self.buffer, encode_key(id, WireType::EightBytes));
                self.buffer.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            FieldMut::String(v) => self.write_length_delimited(id, v.as_bytes()),
            FieldMut::Bytes(v) => self.write_length_delimited(id, v),
        }
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        let mut nested = ToProtoVisitor::new();
        value.accept(&mut nested);
        self.unencodable += nested.unencodable;
        // An all-default nested message is omitted like any other default.
        if !nested.buffer.is_empty() {
            self.write_length_delimited(field.id, &nested.buffer);
        }
    }
}
