// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Varint, zig-zag and field-key primitives.

use super::WireType;

/// Longest varint a `u64` can need.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` as a base-128 varint, returning the number of bytes written.
pub fn write_varint(buffer: &mut Vec<u8>, mut value: u64) -> usize {
    let start = buffer.len();
    while value >= 0x80 {
        buffer.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
    buffer.len() - start
}

/// Number of bytes [`write_varint`] produces for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Field key: `(identifier << 3) | wire type`.
pub fn encode_key(identifier: u32, wire_type: WireType) -> u64 {
    (u64::from(identifier) << 3) | u64::from(wire_type as u8)
}

/// Split a field key into identifier and raw wire type.
///
/// The identifier is `None` when it does not fit a `u32`.
pub fn decode_key(key: u64) -> (Option<u32>, u8) {
    (u32::try_from(key >> 3).ok(), (key & 0x7) as u8)
}

/// Generate a zig-zag encode/decode pair for one signed width.
///
/// Encoding maps `0, -1, 1, -2, ...` to `0, 1, 2, 3, ...` so small
/// magnitudes stay short as varints.
macro_rules! impl_zigzag {
    ($encode:ident, $decode:ident, $signed:ty, $unsigned:ty) => {
        pub fn $encode(value: $signed) -> $unsigned {
            ((value << 1) ^ (value >> (<$signed>::BITS - 1))) as $unsigned
        }

        pub fn $decode(value: $unsigned) -> $signed {
            ((value >> 1) as $signed) ^ -((value & 1) as $signed)
        }
    };
}

impl_zigzag!(zigzag_encode_8, zigzag_decode_8, i8, u8);
impl_zigzag!(zigzag_encode_16, zigzag_decode_16, i16, u16);
impl_zigzag!(zigzag_encode_32, zigzag_decode_32, i32, u32);
impl_zigzag!(zigzag_encode_64, zigzag_decode_64, i64, u64);
