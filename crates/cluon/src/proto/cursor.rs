// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked read cursor over wire bytes.

use super::varint::MAX_VARINT_LEN;
use super::{WireError, WireResult};

/// Generate fixed-width little-endian read methods.
///
/// Each generated method checks the remaining length first and leaves the
/// offset untouched on failure.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> WireResult<$type> {
            let bytes = self.read_bytes($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_u64_le, u64, 8);

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> WireResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(WireError::ReadFailed {
                offset: self.offset,
                reason: format!("need {} bytes, {} left", len, self.remaining()),
            });
        }
        let bytes = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Read one base-128 varint.
    pub fn read_varint(&mut self) -> WireResult<u64> {
        let start = self.offset;
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.buffer.get(self.offset) else {
                self.offset = start;
                return Err(WireError::ReadFailed {
                    offset: start,
                    reason: "truncated varint".into(),
                });
            };
            self.offset += 1;
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        self.offset = start;
        Err(WireError::VarintOverflow { offset: start })
    }

    /// Read a varint length prefix followed by that many bytes.
    pub fn read_length_delimited(&mut self) -> WireResult<&'a [u8]> {
        let start = self.offset;
        let length = self.read_varint()?;
        let remaining = self.remaining();
        match usize::try_from(length) {
            Ok(len) if len <= remaining => self.read_bytes(len),
            _ => {
                self.offset = start;
                Err(WireError::LengthOverflow {
                    offset: start,
                    length,
                    remaining,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fixed() {
        let data = [0x78, 0x56, 0x34, 0x12, 1, 0, 0, 0, 0, 0, 0, 0x80];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_u64_le().unwrap(), 0x8000_0000_0000_0001);
        assert!(cursor.is_empty());
        assert!(matches!(
            cursor.read_u32_le(),
            Err(WireError::ReadFailed { offset: 12, .. })
        ));
    }

    #[test]
    fn test_read_varint() {
        let data = [0xAC, 0x02, 0x7F];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_varint().unwrap(), 300);
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.read_varint().unwrap(), 127);
    }

    #[test]
    fn test_truncated_varint_keeps_offset() {
        let data = [0x80, 0x80];
        let mut cursor = Cursor::new(&data);
        assert!(matches!(
            cursor.read_varint(),
            Err(WireError::ReadFailed { offset: 0, .. })
        ));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_overlong_varint() {
        let data = [0xFF; 11];
        let mut cursor = Cursor::new(&data);
        assert!(matches!(
            cursor.read_varint(),
            Err(WireError::VarintOverflow { offset: 0 })
        ));
    }

    #[test]
    fn test_length_delimited() {
        let data = [0x02, b'h', b'i', 0x05, b'x'];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_length_delimited().unwrap(), b"hi");
        assert!(matches!(
            cursor.read_length_delimited(),
            Err(WireError::LengthOverflow {
                offset: 3,
                length: 5,
                remaining: 1
            })
        ));
        assert_eq!(cursor.offset(), 3);
    }
}
