// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OD4 envelopes
//!
//! An [`Envelope`] wraps one encoded message together with its type id,
//! sender and time stamps. On the wire it is framed as:
//!
//! ```text
//! 0x0D 0xA4 LEN0 LEN1 LEN2 <binary-encoded Envelope>
//! ```
//!
//! where `0xA4 LEN0 LEN1 LEN2` read as a little-endian `u32` is
//! `(payload length << 8) | 0xA4`.

#[cfg(feature = "json")]
mod converter;

#[cfg(feature = "json")]
pub use converter::{EnvelopeConverter, SharedEnvelopeConverter};

use crate::proto;
use crate::Message;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Size of the OD4 frame header.
pub const OD4_HEADER_SIZE: usize = 5;
pub const OD4_HEADER_BYTE0: u8 = 0x0D;
pub const OD4_HEADER_BYTE1: u8 = 0xA4;
/// Largest payload the 24-bit length field can announce.
pub const OD4_MAX_PAYLOAD: usize = 0x00FF_FFFF;

/// Seconds and microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Message)]
#[cluon(id = 12, name = "cluon.data.TimeStamp")]
pub struct TimeStamp {
    pub seconds: i32,
    pub microseconds: i32,
}

impl TimeStamp {
    pub fn new(seconds: i32, microseconds: i32) -> Self {
        Self {
            seconds,
            microseconds,
        }
    }

    /// Current wall-clock time; the epoch when the clock is before it.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self::new(d.as_secs() as i32, d.subsec_micros() as i32))
            .unwrap_or_default()
    }
}

/// One message in transit.
#[derive(Debug, Clone, Default, PartialEq, Message)]
#[cluon(id = 1, name = "cluon.data.Envelope")]
pub struct Envelope {
    /// Message identifier of the payload.
    #[cluon(name = "dataType")]
    pub data_type: i32,
    /// Binary-encoded payload.
    #[cluon(name = "serializedData")]
    pub serialized_data: Vec<u8>,
    #[cluon(type_name = "cluon.data.TimeStamp")]
    pub sent: TimeStamp,
    #[cluon(type_name = "cluon.data.TimeStamp")]
    pub received: TimeStamp,
    #[cluon(name = "sampleTimeStamp", type_name = "cluon.data.TimeStamp")]
    pub sample_time_stamp: TimeStamp,
    #[cluon(name = "senderStamp")]
    pub sender_stamp: u32,
}

/// OD4 framing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Incomplete header: {0} of 5 bytes")]
    IncompleteHeader(usize),

    #[error("Invalid header: {0:#04x} {1:#04x}")]
    InvalidHeader(u8, u8),

    #[error("Truncated payload: expected {expected} bytes, got {available}")]
    Truncated { expected: usize, available: usize },

    #[error("Payload too large: {0} bytes, at most 16777215 fit the header")]
    PayloadTooLarge(usize),
}

/// Length announced by an OD4 header.
fn payload_length(header: &[u8]) -> usize {
    let raw = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
    (raw >> 8) as usize
}

/// Encode `envelope` and prepend the OD4 header.
///
/// Fails when the encoded envelope does not fit the 24-bit length field.
pub fn serialize_envelope(mut envelope: Envelope) -> Result<Vec<u8>, EnvelopeError> {
    let payload = proto::encode(&mut envelope);
    if payload.len() > OD4_MAX_PAYLOAD {
        return Err(EnvelopeError::PayloadTooLarge(payload.len()));
    }

    let length = ((payload.len() as u32) << 8).to_le_bytes();
    let mut frame = Vec::with_capacity(OD4_HEADER_SIZE + payload.len());
    frame.push(OD4_HEADER_BYTE0);
    frame.push(OD4_HEADER_BYTE1);
    frame.extend_from_slice(&length[1..]);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Read one OD4 frame from the start of `data`.
///
/// Returns the envelope and the number of bytes the frame occupied; bytes
/// after the frame are left alone.
pub fn extract_envelope(data: &[u8]) -> Result<(Envelope, usize), EnvelopeError> {
    if data.len() < OD4_HEADER_SIZE {
        return Err(EnvelopeError::IncompleteHeader(data.len()));
    }
    if data[0] != OD4_HEADER_BYTE0 || data[1] != OD4_HEADER_BYTE1 {
        return Err(EnvelopeError::InvalidHeader(data[0], data[1]));
    }

    let length = payload_length(data);
    let available = data.len() - OD4_HEADER_SIZE;
    if available < length {
        return Err(EnvelopeError::Truncated {
            expected: length,
            available,
        });
    }

    let end = OD4_HEADER_SIZE + length;
    let mut envelope = Envelope::default();
    let diagnostics = proto::decode_into(&data[OD4_HEADER_SIZE..end], &mut envelope);
    if !diagnostics.is_clean() {
        log::debug!("[envelope] decoded with {:?}", diagnostics);
    }
    Ok((envelope, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            data_type: 19,
            serialized_data: vec![0x08, 0x07],
            sent: TimeStamp::new(1, 2),
            received: TimeStamp::default(),
            sample_time_stamp: TimeStamp::new(3, 0),
            sender_stamp: 4,
        }
    }

    #[test]
    fn test_header_layout() {
        let frame = serialize_envelope(sample()).unwrap();
        assert_eq!(&frame[..2], &[0x0D, 0xA4]);
        let length = frame.len() - OD4_HEADER_SIZE;
        assert_eq!(payload_length(&frame), length);
        assert_eq!(frame[2] as usize, length & 0xFF);
    }

    #[test]
    fn test_envelope_wire_bytes() {
        let mut envelope = Envelope {
            data_type: 1,
            sample_time_stamp: TimeStamp::new(1, 0),
            ..Envelope::default()
        };
        // dataType = 1 (zig-zag 2); sampleTimeStamp { seconds = 1 }
        assert_eq!(
            proto::encode(&mut envelope),
            vec![0x08, 0x02, 0x2A, 0x02, 0x08, 0x02]
        );
    }

    #[test]
    fn test_extract_roundtrip_with_trailing_bytes() {
        let mut frame = serialize_envelope(sample()).unwrap();
        let frame_len = frame.len();
        frame.extend_from_slice(&[0x0D, 0xA4]);

        let (envelope, used) = extract_envelope(&frame).unwrap();
        assert_eq!(envelope, sample());
        assert_eq!(used, frame_len);
    }

    #[test]
    fn test_extract_errors() {
        assert_eq!(
            extract_envelope(&[0x0D, 0xA4]),
            Err(EnvelopeError::IncompleteHeader(2))
        );
        assert_eq!(
            extract_envelope(&[0x0D, 0xA5, 0, 0, 0]),
            Err(EnvelopeError::InvalidHeader(0x0D, 0xA5))
        );
        assert_eq!(
            extract_envelope(&[0x0D, 0xA4, 3, 0, 0, 0x08]),
            Err(EnvelopeError::Truncated {
                expected: 3,
                available: 1
            })
        );
        assert_eq!(
            EnvelopeError::InvalidHeader(0x0D, 0xA5).to_string(),
            "Invalid header: 0x0d 0xa5"
        );
    }

    #[test]
    fn test_empty_envelope_frame() {
        let frame = serialize_envelope(Envelope::default()).unwrap();
        assert_eq!(frame, vec![0x0D, 0xA4, 0, 0, 0]);
        let (envelope, used) = extract_envelope(&frame).unwrap();
        assert_eq!(envelope, Envelope::default());
        assert_eq!(used, 5);
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let largest = Envelope {
            serialized_data: vec![0xAB; OD4_MAX_PAYLOAD - 5],
            ..Envelope::default()
        };
        // key + 4-byte length + data
        let frame = serialize_envelope(largest).unwrap();
        assert_eq!(payload_length(&frame), OD4_MAX_PAYLOAD);

        let oversized = Envelope {
            serialized_data: vec![0xAB; OD4_MAX_PAYLOAD + 1],
            ..Envelope::default()
        };
        let err = serialize_envelope(oversized).unwrap_err();
        assert_eq!(err, EnvelopeError::PayloadTooLarge(OD4_MAX_PAYLOAD + 6));
        assert!(err.to_string().starts_with("Payload too large: 16777221 bytes"));
    }

    #[test]
    fn test_time_stamp_now() {
        let now = TimeStamp::now();
        assert!(now.seconds > 1_600_000_000);
        assert!((0..1_000_000).contains(&now.microseconds));
    }
}
