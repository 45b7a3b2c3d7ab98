// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delimiter-separated rows of visited messages.
//!
//! Every visited message appends one row. The header line is filled from the
//! first message only. Nested message fields are flattened with their field
//! name as a dotted prefix. Every cell, the last one included, is followed by
//! the delimiter.
//!
//! ```text
//! flag;pos.x;pos.y;tag;
//! 1;1.5;-2;"b24=";
//! ```

use crate::visitor::{FieldInfo, FieldMut, Visitable, Visitor};
use base64::Engine;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Visitor collecting one row per visited message.
#[derive(Debug)]
pub struct ToCsvVisitor {
    mask: HashMap<u32, bool>,
    prefix: String,
    delimiter: char,
    with_header: bool,
    nested: bool,
    fill_header: bool,
    header: String,
    rows: String,
}

impl Default for ToCsvVisitor {
    fn default() -> Self {
        Self::new(';', true)
    }
}

impl ToCsvVisitor {
    pub fn new(delimiter: char, with_header: bool) -> Self {
        Self {
            mask: HashMap::new(),
            prefix: String::new(),
            delimiter,
            with_header,
            nested: false,
            fill_header: true,
            header: String::new(),
            rows: String::new(),
        }
    }

    /// Write only selected top-level fields.
    ///
    /// A field is skipped when its identifier maps to `false`.
    pub fn with_mask(mut self, mask: HashMap<u32, bool>) -> Self {
        self.mask = mask;
        self
    }

    /// Header line (when enabled) followed by every row so far.
    pub fn csv(&self) -> String {
        if self.with_header {
            format!("{}{}", self.header, self.rows)
        } else {
            self.rows.clone()
        }
    }

    /// Drop all rows; the next message fills the header again.
    pub fn clear(&mut self) {
        self.header.clear();
        self.rows.clear();
        self.fill_header = true;
    }

    fn nested_visitor(&self, name: &str) -> Self {
        Self {
            prefix: self.column(name),
            nested: true,
            ..Self::new(self.delimiter, self.with_header)
        }
    }

    fn column(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.prefix, name)
        }
    }

    fn included(&self, id: u32) -> bool {
        self.mask.get(&id).copied().unwrap_or(true)
    }
}

fn quoted_base64(data: &[u8]) -> String {
    format!("\"{}\"", base64::engine::general_purpose::STANDARD.encode(data))
}

impl Visitor for ToCsvVisitor {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        if !self.included(field.id) {
            return;
        }
        if self.fill_header {
            let column = self.column(field.name);
            let _ = write!(self.header, "{}{}", column, self.delimiter);
        }
        let cell = match value {
            FieldMut::Bool(v) => u8::from(*v).to_string(),
            FieldMut::Char(v) => v.to_string(),
            FieldMut::Int8(v) => v.to_string(),
            FieldMut::Uint8(v) => v.to_string(),
            FieldMut::Int16(v) => v.to_string(),
            FieldMut::Uint16(v) => v.to_string(),
            FieldMut::Int32(v) => v.to_string(),
            FieldMut::Uint32(v) => v.to_string(),
            FieldMut::Int64(v) => v.to_string(),
            FieldMut::Uint64(v) => v.to_string(),
            FieldMut::Float(v) => v.to_string(),
            FieldMut::Double(v) => v.to_string(),
            // Quoted base64 keeps delimiters and line breaks out of the cell.
            FieldMut::String(v) => quoted_base64(v.as_bytes()),
            FieldMut::Bytes(v) => quoted_base64(v),
        };
        let _ = write!(self.rows, "{}{}", cell, self.delimiter);
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        if !self.included(field.id) {
            return;
        }
        let mut nested = self.nested_visitor(field.name);
        value.accept(&mut nested);
        if self.fill_header {
            self.header.push_str(&nested.header);
        }
        self.rows.push_str(&nested.rows);
    }

    fn post_visit(&mut self) {
        if self.nested {
            return;
        }
        if self.fill_header {
            self.header.push('\n');
            self.fill_header = false;
        }
        self.rows.push('\n');
    }
}
