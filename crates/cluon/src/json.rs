// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON rendering and parsing of visitable messages.
//!
//! Fields map to object members named after the field. Strings stay JSON
//! strings, `char` becomes a one-character string, `bytes` are base64 and
//! nested messages become nested objects.

use crate::visitor::{Decoder, FieldInfo, FieldMut, Visitable, Visitor};
use base64::Engine;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Visitor rendering the fields it is shown as a JSON object.
#[derive(Debug, Default)]
pub struct ToJsonVisitor {
    object: Map<String, Value>,
    mask: HashMap<u32, bool>,
}

impl ToJsonVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render only selected top-level fields.
    ///
    /// A field is skipped when its identifier maps to `false`; identifiers
    /// absent from `mask` are rendered.
    pub fn with_mask(mask: HashMap<u32, bool>) -> Self {
        Self {
            object: Map::new(),
            mask,
        }
    }

    /// Compact JSON text of everything visited so far.
    pub fn json(&self) -> String {
        Value::Object(self.object.clone()).to_string()
    }

    pub fn value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }

    fn included(&self, id: u32) -> bool {
        self.mask.get(&id).copied().unwrap_or(true)
    }
}

fn float_value(v: f64) -> Value {
    // NaN and infinities have no JSON form.
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

impl Visitor for ToJsonVisitor {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        if !self.included(field.id) {
            return;
        }
        let json = match value {
            FieldMut::Bool(v) => Value::Bool(*v),
            FieldMut::Char(v) => Value::String(v.to_string()),
            FieldMut::Int8(v) => Value::from(*v),
            FieldMut::Uint8(v) => Value::from(*v),
            FieldMut::Int16(v) => Value::from(*v),
            FieldMut::Uint16(v) => Value::from(*v),
            FieldMut::Int32(v) => Value::from(*v),
            FieldMut::Uint32(v) => Value::from(*v),
            FieldMut::Int64(v) => Value::from(*v),
            FieldMut::Uint64(v) => Value::from(*v),
            FieldMut::Float(v) => float_value(f64::from(*v)),
            FieldMut::Double(v) => float_value(*v),
            FieldMut::String(v) => Value::String(v.clone()),
            FieldMut::Bytes(v) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(v.as_slice()))
            }
        };
        self.object.insert(field.name.to_string(), json);
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        if !self.included(field.id) {
            return;
        }
        let mut nested = ToJsonVisitor::new();
        value.accept(&mut nested);
        self.object.insert(field.name.to_string(), nested.into_value());
    }
}

/// Visitor filling the fields it is shown from a JSON object, by name.
///
/// Numbers convert leniently between JSON representations (`"7"`, `7` and
/// `7.0` all fill a `uint8`). Values that do not fit leave the field as it
/// was.
#[derive(Debug, Default)]
pub struct FromJsonVisitor {
    object: Map<String, Value>,
}

impl FromJsonVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prime from an already parsed value; anything but an object is empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(object) => Self { object },
            _ => Self::default(),
        }
    }

    /// Prime from JSON text.
    pub fn from_json(json: &str) -> Self {
        let mut visitor = Self::default();
        visitor.decode_from(json.as_bytes());
        visitor
    }
}

impl Decoder for FromJsonVisitor {
    fn decode_from(&mut self, data: &[u8]) {
        self.object = match serde_json::from_slice::<Value>(data) {
            Ok(Value::Object(object)) => object,
            Ok(_) => Map::new(),
            Err(e) => {
                if !data.is_empty() {
                    log::debug!("[json] ignoring unparsable input: {}", e);
                }
                Map::new()
            }
        };
    }
}

/// Integral view of a JSON value, truncating floats.
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i128)),
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f.trunc() as i128)),
        Value::Bool(b) => Some(i128::from(*b)),
        _ => None,
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Store `value` into `target` when it converts without loss of range.
fn set_integer<T: TryFrom<i128>>(target: &mut T, value: &Value) -> bool {
    match integer(value).and_then(|i| T::try_from(i).ok()) {
        Some(v) => {
            *target = v;
            true
        }
        None => false,
    }
}

impl Visitor for FromJsonVisitor {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        let Some(json) = self.object.get(field.name) else {
            return;
        };

        let fits = match value {
            FieldMut::Bool(v) => match json {
                Value::Bool(b) => {
                    *v = *b;
                    true
                }
                other => match integer(other) {
                    Some(i) => {
                        *v = i != 0;
                        true
                    }
                    None => false,
                },
            },
            FieldMut::Char(v) => match json {
                Value::String(s) => match s.chars().next() {
                    Some(c) => {
                        *v = c;
                        true
                    }
                    None => false,
                },
                other => match integer(other).and_then(|i| u8::try_from(i).ok()) {
                    Some(b) => {
                        *v = char::from(b);
                        true
                    }
                    None => false,
                },
            },
            FieldMut::Int8(v) => set_integer(v, json),
            FieldMut::Uint8(v) => set_integer(v, json),
            FieldMut::Int16(v) => set_integer(v, json),
            FieldMut::Uint16(v) => set_integer(v, json),
            FieldMut::Int32(v) => set_integer(v, json),
            FieldMut::Uint32(v) => set_integer(v, json),
            FieldMut::Int64(v) => set_integer(v, json),
            FieldMut::Uint64(v) => set_integer(v, json),
            FieldMut::Float(v) => match float(json) {
                Some(f) => {
                    *v = f as f32;
                    true
                }
                None => false,
            },
            FieldMut::Double(v) => match float(json) {
                Some(f) => {
                    *v = f;
                    true
                }
                None => false,
            },
            FieldMut::String(v) => match json {
                Value::String(s) => {
                    v.clone_from(s);
                    true
                }
                Value::Number(_) | Value::Bool(_) => {
                    *v = json.to_string();
                    true
                }
                _ => false,
            },
            FieldMut::Bytes(v) => match json {
                Value::String(s) => match base64::engine::general_purpose::STANDARD.decode(s) {
                    Ok(bytes) => {
                        *v = bytes;
                        true
                    }
                    Err(_) => false,
                },
                // A nested object read as bytes primes the next decoder.
                Value::Object(_) => {
                    *v = json.to_string().into_bytes();
                    true
                }
                _ => false,
            },
        };

        if !fits {
            log::trace!(
                "[json] field '{}' ({}) left unchanged, {} does not fit",
                field.name,
                field.type_name,
                json
            );
        }
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        match self.object.get(field.name) {
            Some(Value::Object(object)) => {
                let mut nested = FromJsonVisitor {
                    object: object.clone(),
                };
                value.accept(&mut nested);
            }
            Some(other) => log::trace!(
                "[json] field '{}' ({}) left unchanged, {} is not an object",
                field.name,
                field.type_name,
                other
            ),
            None => {}
        }
    }
}
