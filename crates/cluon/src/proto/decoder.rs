// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary decoder.
//!
//! The input is scanned once into a table keyed by field identifier; the
//! visited message then pulls the entries it declares. Entries nobody asks
//! for are unknown fields and are dropped. When a field appears twice, the
//! first occurrence is kept. Nested messages are decoded down to
//! [`MAX_NESTING_DEPTH`] levels.

use super::cursor::Cursor;
use super::varint::{
    decode_key, zigzag_decode_16, zigzag_decode_32, zigzag_decode_64, zigzag_decode_8,
};
use super::{WireError, WireResult, WireType};
use crate::visitor::{Decoder, FieldInfo, FieldMut, Visitable, Visitor, MAX_NESTING_DEPTH};
use std::collections::{HashMap, HashSet};

/// One scanned field payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(Vec<u8>),
    Fixed32(u32),
}

impl WireValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::EightBytes,
            Self::LengthDelimited(_) => WireType::LengthDelimited,
            Self::Fixed32(_) => WireType::FourBytes,
        }
    }
}

/// Counters for everything the decoder recovered from silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeDiagnostics {
    /// Fields on the wire that the target message does not declare.
    pub unknown_fields: usize,
    /// Fields whose wire type or payload did not fit the declared type.
    pub type_mismatches: usize,
    /// Scans that stopped early on broken framing, and nested messages
    /// skipped at the nesting limit.
    pub malformed_frames: usize,
}

impl DecodeDiagnostics {
    /// True when nothing was skipped.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(&mut self, other: &DecodeDiagnostics) {
        self.unknown_fields += other.unknown_fields;
        self.type_mismatches += other.type_mismatches;
        self.malformed_frames += other.malformed_frames;
    }
}

/// Visitor filling the fields it is shown from scanned wire bytes.
#[derive(Debug, Default)]
pub struct FromProtoVisitor {
    values: HashMap<u32, WireValue>,
    consumed: HashSet<u32>,
    diagnostics: DecodeDiagnostics,
    depth: usize,
}

impl FromProtoVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanned payload for `id`, if present.
    pub fn value(&self, id: u32) -> Option<&WireValue> {
        self.values.get(&id)
    }

    /// Number of distinct fields found on the wire.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Counters so far; fields not yet visited count as unknown.
    pub fn diagnostics(&self) -> DecodeDiagnostics {
        let mut diagnostics = self.diagnostics;
        diagnostics.unknown_fields += self
            .values
            .keys()
            .filter(|id| !self.consumed.contains(id))
            .count();
        diagnostics
    }

    fn scan(&mut self, data: &[u8]) -> WireResult<()> {
        let mut cursor = Cursor::new(data);
        while !cursor.is_empty() {
            let key_offset = cursor.offset();
            let (key_id, raw_wire_type) = decode_key(cursor.read_varint()?);
            let value = match WireType::from_u8(raw_wire_type) {
                Some(WireType::Varint) => WireValue::Varint(cursor.read_varint()?),
                Some(WireType::EightBytes) => WireValue::Fixed64(cursor.read_u64_le()?),
                Some(WireType::LengthDelimited) => {
                    WireValue::LengthDelimited(cursor.read_length_delimited()?.to_vec())
                }
                Some(WireType::FourBytes) => WireValue::Fixed32(cursor.read_u32_le()?),
                None => {
                    return Err(WireError::UnknownWireType {
                        offset: key_offset,
                        wire_type: raw_wire_type,
                    })
                }
            };
            match key_id {
                Some(id) => {
                    self.values.entry(id).or_insert(value);
                }
                None => {
                    // No declared field can carry an identifier beyond u32.
                    self.diagnostics.unknown_fields += 1;
                    log::trace!("[proto] skipping out-of-range field key at offset {}", key_offset);
                }
            }
        }
        Ok(())
    }

    fn mismatch(&mut self, field: FieldInfo<'_>, found: WireType) {
        self.diagnostics.type_mismatches += 1;
        log::trace!(
            "[proto] field {} '{}' ({}) left unchanged, wire type {:?} does not fit",
            field.id,
            field.name,
            field.type_name,
            found
        );
    }
}

impl Decoder for FromProtoVisitor {
    /// Scan `data`, replacing anything scanned before.
    fn decode_from(&mut self, data: &[u8]) {
        self.values.clear();
        self.consumed.clear();
        self.diagnostics = DecodeDiagnostics::default();

        if let Err(e) = self.scan(data) {
            self.diagnostics.malformed_frames += 1;
            log::debug!(
                "[proto] stopped scanning: {} (keeping {} field(s))",
                e,
                self.values.len()
            );
        }
    }

    fn absorb(&mut self, nested: &Self) {
        self.diagnostics.merge(&nested.diagnostics());
    }

    fn nesting_limit_reached(&mut self, field: FieldInfo<'_>) {
        self.diagnostics.malformed_frames += 1;
        log::debug!(
            "[proto] field {} '{}' ({}) nested deeper than {} levels, left unset",
            field.id,
            field.name,
            field.type_name,
            MAX_NESTING_DEPTH
        );
    }
}

impl Visitor for FromProtoVisitor {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        let Some(wire) = self.values.get(&field.id) else {
            return;
        };
        self.consumed.insert(field.id);

        let fits = match (value, wire) {
            (FieldMut::Bool(v), WireValue::Varint(raw)) => {
                *v = *raw != 0;
                true
            }
            (FieldMut::Char(v), WireValue::Varint(raw)) => {
                *v = char::from(*raw as u8);
                true
            }
            (FieldMut::Int8(v), WireValue::Varint(raw)) => {
                *v = zigzag_decode_8(*raw as u8);
                true
            }
            (FieldMut::Uint8(v), WireValue::Varint(raw)) => {
                *v = *raw as u8;
                true
            }
            (FieldMut::Int16(v), WireValue::Varint(raw)) => {
                *v = zigzag_decode_16(*raw as u16);
                true
            }
            (FieldMut::Uint16(v), WireValue::Varint(raw)) => {
                *v = *raw as u16;
                true
            }
            (FieldMut::Int32(v), WireValue::Varint(raw)) => {
                *v = zigzag_decode_32(*raw as u32);
                true
            }
            (FieldMut::Uint32(v), WireValue::Varint(raw)) => {
                *v = *raw as u32;
                true
            }
            (FieldMut::Int64(v), WireValue::Varint(raw)) => {
                *v = zigzag_decode_64(*raw);
                true
            }
            (FieldMut::Uint64(v), WireValue::Varint(raw)) => {
                *v = *raw;
                true
            }
            (FieldMut::Float(v), WireValue::Fixed32(raw)) => {
                *v = f32::from_bits(*raw);
                true
            }
            (FieldMut::Double(v), WireValue::Fixed64(raw)) => {
                *v = f64::from_bits(*raw);
                true
            }
            (FieldMut::String(v), WireValue::LengthDelimited(raw)) => {
                match std::str::from_utf8(raw) {
                    Ok(s) => {
                        v.clear();
                        v.push_str(s);
                        true
                    }
                    Err(_) => false,
                }
            }
            (FieldMut::Bytes(v), WireValue::LengthDelimited(raw)) => {
                v.clone_from(raw);
                true
            }
            _ => false,
        };

        if !fits {
            let found = wire.wire_type();
            self.mismatch(field, found);
        }
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        let Some(wire) = self.values.get(&field.id) else {
            return;
        };
        self.consumed.insert(field.id);

        match wire {
            WireValue::LengthDelimited(_) if self.depth + 1 >= MAX_NESTING_DEPTH => {
                self.nesting_limit_reached(field);
            }
            WireValue::LengthDelimited(bytes) => {
                let mut nested = FromProtoVisitor {
                    depth: self.depth + 1,
                    ..FromProtoVisitor::default()
                };
                nested.decode_from(bytes);
                value.accept(&mut nested);
                self.absorb(&nested);
            }
            other => {
                let found = other.wire_type();
                self.mismatch(field, found);
            }
        }
    }

    fn post_visit(&mut self) {
        let diagnostics = self.diagnostics();
        if !diagnostics.is_clean() {
            log::trace!("[proto] decode finished with {:?}", diagnostics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::varint::write_varint;

    fn decoder(data: &[u8]) -> FromProtoVisitor {
        let mut decoder = FromProtoVisitor::new();
        decoder.decode_from(data);
        decoder
    }

    #[test]
    fn test_scan_table() {
        let d = decoder(&[0x08, 0x07, 0x12, 0x02, b'h', b'i', 0x1D, 0, 0, 0x80, 0x3F]);
        assert_eq!(d.len(), 3);
        assert_eq!(d.value(1), Some(&WireValue::Varint(7)));
        assert_eq!(d.value(2), Some(&WireValue::LengthDelimited(b"hi".to_vec())));
        assert_eq!(d.value(3), Some(&WireValue::Fixed32(0x3F80_0000)));
        assert!(d.diagnostics().malformed_frames == 0);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut d = decoder(&[0x08, 0x01, 0x08, 0x02]);
        let mut v = 0u8;
        d.visit(FieldInfo::new(1, "uint8", "v"), FieldMut::Uint8(&mut v));
        assert_eq!(v, 1);
        assert!(d.diagnostics().is_clean());
    }

    #[test]
    fn test_signed_fields_are_unzigzagged() {
        let mut d = decoder(&[0x08, 0x03, 0x10, 0x03]);
        let mut signed = 0i32;
        let mut unsigned = 0u32;
        d.visit(FieldInfo::new(1, "int32", "s"), FieldMut::Int32(&mut signed));
        d.visit(FieldInfo::new(2, "uint32", "u"), FieldMut::Uint32(&mut unsigned));
        assert_eq!(signed, -2);
        assert_eq!(unsigned, 3);
    }

    #[test]
    fn test_wire_type_mismatch_leaves_field() {
        // Field 1 arrives as a string but is declared as uint32.
        let mut d = decoder(&[0x0A, 0x01, b'x']);
        let mut v = 42u32;
        d.visit(FieldInfo::new(1, "uint32", "v"), FieldMut::Uint32(&mut v));
        assert_eq!(v, 42);
        assert_eq!(d.diagnostics().type_mismatches, 1);
        assert_eq!(d.diagnostics().unknown_fields, 0);
    }

    #[test]
    fn test_invalid_utf8_leaves_string() {
        let mut d = decoder(&[0x0A, 0x02, 0xC3, 0x28]);
        let mut s = "keep".to_string();
        d.visit(FieldInfo::new(1, "string", "s"), FieldMut::String(&mut s));
        assert_eq!(s, "keep");
        assert_eq!(d.diagnostics().type_mismatches, 1);
    }

    #[test]
    fn test_unvisited_fields_count_as_unknown() {
        let d = decoder(&[0x08, 0x01, 0x98, 0x06, 0x05]);
        assert_eq!(d.diagnostics().unknown_fields, 2);
    }

    #[test]
    fn test_length_overflow_keeps_prefix() {
        // Field 1 is fine, field 2 claims 100 bytes.
        let mut d = decoder(&[0x08, 0x07, 0x12, 0x64, b'a']);
        let mut a = 0u8;
        let mut b = String::new();
        d.visit(FieldInfo::new(1, "uint8", "a"), FieldMut::Uint8(&mut a));
        d.visit(FieldInfo::new(2, "string", "b"), FieldMut::String(&mut b));
        assert_eq!(a, 7);
        assert_eq!(b, "");
        assert_eq!(d.diagnostics().malformed_frames, 1);
    }

    #[test]
    fn test_unknown_wire_type_stops_scan() {
        let d = decoder(&[0x08, 0x07, 0x0B, 0x01]);
        assert_eq!(d.len(), 1);
        assert_eq!(d.diagnostics().malformed_frames, 1);
    }

    #[test]
    fn test_truncated_fixed_width() {
        let d = decoder(&[0x09, 0x00, 0x00]);
        assert!(d.is_empty());
        assert_eq!(d.diagnostics().malformed_frames, 1);
    }

    #[test]
    fn test_reuse_resets_state() {
        let mut d = decoder(&[0x08, 0x01, 0xFF]);
        assert_eq!(d.diagnostics().malformed_frames, 1);
        d.decode_from(&[0x10, 0x01]);
        assert_eq!(d.len(), 1);
        assert!(d.value(1).is_none());
        assert_eq!(d.diagnostics().malformed_frames, 0);
    }

    #[test]
    fn test_out_of_range_key_is_unknown() {
        let mut data = Vec::new();
        write_varint(&mut data, ((1u64 << 32) + 1) << 3);
        data.extend_from_slice(&[0x05, 0x08, 0x07]);

        let mut d = decoder(&data);
        let mut v = 0u8;
        d.visit(FieldInfo::new(1, "uint8", "v"), FieldMut::Uint8(&mut v));
        assert_eq!(v, 7);
        assert_eq!(d.diagnostics().unknown_fields, 1);
        assert_eq!(d.diagnostics().malformed_frames, 0);
    }

    #[derive(Default)]
    struct Chain {
        next: Option<Box<Chain>>,
        value: u8,
    }

    impl Visitable for Chain {
        fn accept<V: Visitor>(&mut self, visitor: &mut V) {
            visitor.pre_visit(1, "Chain", "t.Chain");
            let next = self.next.get_or_insert_with(Box::default);
            visitor.visit_message(FieldInfo::new(1, "t.Chain", "next"), &mut **next);
            visitor.visit(FieldInfo::new(2, "uint8", "value"), FieldMut::Uint8(&mut self.value));
            visitor.post_visit();
        }
    }

    /// `value = 1` wrapped in `levels` nested `next` fields.
    fn chain_bytes(levels: usize) -> Vec<u8> {
        let mut len = 2;
        let mut headers = Vec::with_capacity(levels);
        for _ in 0..levels {
            let mut header = vec![0x0A];
            write_varint(&mut header, len as u64);
            len += header.len();
            headers.push(header);
        }
        let mut data: Vec<u8> = headers.into_iter().rev().flatten().collect();
        data.extend_from_slice(&[0x10, 0x01]);
        data
    }

    fn innermost_value(chain: &Chain) -> u8 {
        let mut node = chain;
        while let Some(next) = node.next.as_deref() {
            if next.next.is_none() {
                break;
            }
            node = next;
        }
        node.value
    }

    #[test]
    fn test_shallow_nesting_is_decoded() {
        let mut chain = Chain::default();
        let mut d = decoder(&chain_bytes(10));
        chain.accept(&mut d);
        assert!(d.diagnostics().is_clean());
        assert_eq!(innermost_value(&chain), 1);
    }

    #[test]
    fn test_deep_nesting_stops_at_limit() {
        let mut chain = Chain::default();
        let mut d = decoder(&chain_bytes(20_000));
        chain.accept(&mut d);

        let diagnostics = d.diagnostics();
        assert_eq!(diagnostics.malformed_frames, 1);
        assert_eq!(diagnostics.unknown_fields, 0);
        assert_eq!(innermost_value(&chain), 0);
    }

    #[test]
    fn test_latin1_char() {
        let mut d = decoder(&[0x08, 0xE9, 0x01]);
        let mut c = '\0';
        d.visit(FieldInfo::new(1, "char", "c"), FieldMut::Char(&mut c));
        assert_eq!(c, 'é');
    }
}
