// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MessagePack encoding and decoding of visitable messages.
//!
//! A message is a map from field name to value. Every field is written,
//! zero values included. `char` becomes a one-character string, `bytes`
//! become a bin value and nested messages become nested maps.

use crate::visitor::{Decoder, FieldInfo, FieldMut, Visitable, Visitor};
use rmpv::Value;
use std::collections::HashMap;

/// Visitor encoding the fields it is shown as a MessagePack map.
#[derive(Debug, Default)]
pub struct ToMsgPackVisitor {
    entries: Vec<(Value, Value)>,
}

impl ToMsgPackVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded map of everything visited so far.
    pub fn encoded_data(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        if let Err(e) = rmpv::encode::write_value(&mut buffer, &self.value()) {
            log::warn!("[msgpack] encoding failed: {}", e);
        }
        buffer
    }

    pub fn value(&self) -> Value {
        Value::Map(self.entries.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Map(self.entries)
    }
}

impl Visitor for ToMsgPackVisitor {
    fn pre_visit(&mut self, _id: i32, _short_name: &str, _long_name: &str) {
        self.entries.clear();
    }

    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        let packed = match value {
            FieldMut::Bool(v) => Value::from(*v),
            FieldMut::Char(v) => Value::from(v.to_string()),
            FieldMut::Int8(v) => Value::from(*v),
            FieldMut::Uint8(v) => Value::from(*v),
            FieldMut::Int16(v) => Value::from(*v),
            FieldMut::Uint16(v) => Value::from(*v),
            FieldMut::Int32(v) => Value::from(*v),
            FieldMut::Uint32(v) => Value::from(*v),
            FieldMut::Int64(v) => Value::from(*v),
            FieldMut::Uint64(v) => Value::from(*v),
            FieldMut::Float(v) => Value::F32(*v),
            FieldMut::Double(v) => Value::F64(*v),
            FieldMut::String(v) => Value::from(v.as_str()),
            FieldMut::Bytes(v) => Value::Binary(v.clone()),
        };
        self.entries.push((Value::from(field.name), packed));
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        let mut nested = ToMsgPackVisitor::new();
        value.accept(&mut nested);
        self.entries.push((Value::from(field.name), nested.into_value()));
    }
}

/// Visitor filling the fields it is shown from a MessagePack map, by name.
///
/// Integers and floats convert between each other when the value fits the
/// field; anything else leaves the field as it was.
#[derive(Debug, Default)]
pub struct FromMsgPackVisitor {
    entries: HashMap<String, Value>,
}

impl FromMsgPackVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prime from an already decoded value; anything but a map is empty.
    pub fn from_value(value: Value) -> Self {
        let Value::Map(pairs) = value else {
            return Self::default();
        };
        let entries = pairs
            .into_iter()
            .filter_map(|(key, value)| key.as_str().map(|k| (k.to_string(), value)))
            .collect();
        Self { entries }
    }
}

impl Decoder for FromMsgPackVisitor {
    fn decode_from(&mut self, data: &[u8]) {
        let mut reader = data;
        *self = match rmpv::decode::read_value(&mut reader) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                if !data.is_empty() {
                    log::debug!("[msgpack] ignoring undecodable input: {}", e);
                }
                Self::default()
            }
        };
    }
}

fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Integer(i) => i
            .as_i64()
            .map(i128::from)
            .or_else(|| i.as_u64().map(i128::from)),
        Value::F32(f) => Some(f.trunc() as i128),
        Value::F64(f) => Some(f.trunc() as i128),
        Value::Boolean(b) => Some(i128::from(*b)),
        _ => None,
    }
}

fn set_integer<T: TryFrom<i128>>(target: &mut T, value: &Value) -> bool {
    match integer(value).and_then(|i| T::try_from(i).ok()) {
        Some(v) => {
            *target = v;
            true
        }
        None => false,
    }
}

impl Visitor for FromMsgPackVisitor {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        let Some(packed) = self.entries.get(field.name) else {
            return;
        };

        let fits = match value {
            FieldMut::Bool(v) => match packed.as_bool().or_else(|| integer(packed).map(|i| i != 0)) {
                Some(b) => {
                    *v = b;
                    true
                }
                None => false,
            },
            FieldMut::Char(v) => match packed.as_str().and_then(|s| s.chars().next()) {
                Some(c) => {
                    *v = c;
                    true
                }
                None => match integer(packed).and_then(|i| u8::try_from(i).ok()) {
                    Some(b) => {
                        *v = char::from(b);
                        true
                    }
                    None => false,
                },
            },
            FieldMut::Int8(v) => set_integer(v, packed),
            FieldMut::Uint8(v) => set_integer(v, packed),
            FieldMut::Int16(v) => set_integer(v, packed),
            FieldMut::Uint16(v) => set_integer(v, packed),
            FieldMut::Int32(v) => set_integer(v, packed),
            FieldMut::Uint32(v) => set_integer(v, packed),
            FieldMut::Int64(v) => set_integer(v, packed),
            FieldMut::Uint64(v) => set_integer(v, packed),
            FieldMut::Float(v) => match packed.as_f64().or_else(|| integer(packed).map(|i| i as f64)) {
                Some(f) => {
                    *v = f as f32;
                    true
                }
                None => false,
            },
            FieldMut::Double(v) => match packed.as_f64().or_else(|| integer(packed).map(|i| i as f64)) {
                Some(f) => {
                    *v = f;
                    true
                }
                None => false,
            },
            FieldMut::String(v) => match packed.as_str() {
                Some(s) => {
                    *v = s.to_string();
                    true
                }
                None => false,
            },
            FieldMut::Bytes(v) => match packed {
                Value::Binary(data) => {
                    v.clone_from(data);
                    true
                }
                Value::String(s) => {
                    *v = s.as_bytes().to_vec();
                    true
                }
                // A nested map read as bytes primes the next decoder.
                Value::Map(_) => {
                    v.clear();
                    rmpv::encode::write_value(v, packed).is_ok()
                }
                _ => false,
            },
        };

        if !fits {
            log::trace!(
                "[msgpack] field '{}' ({}) left unchanged, {} does not fit",
                field.name,
                field.type_name,
                packed
            );
        }
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        match self.entries.get(field.name) {
            Some(nested @ Value::Map(_)) => {
                let mut nested = FromMsgPackVisitor::from_value(nested.clone());
                value.accept(&mut nested);
            }
            Some(other) => log::trace!(
                "[msgpack] field '{}' ({}) left unchanged, {} is not a map",
                field.name,
                field.type_name,
                other
            ),
            None => {}
        }
    }
}
