// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Wire vectors: byte-exact encodings checked against what a protobuf
// implementation produces for the equivalent proto2 schema (sint32 for
// signed narrow types, fixed32/fixed64 layouts for float/double).

#![allow(clippy::float_cmp)]
#![allow(clippy::unreadable_literal)]

use cluon::{proto, FieldInfo, Message, Visitable};

#[derive(Debug, Clone, Default, PartialEq, Message)]
#[cluon(id = 40, name = "test.Inner")]
struct Inner {
    code: u16,
    text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Message)]
#[cluon(id = 41, name = "test.Everything")]
struct Everything {
    flag: bool,
    letter: char,
    tiny: i8,
    small: u8,
    short: i16,
    word: u16,
    int: i32,
    uint: u32,
    long: i64,
    ulong: u64,
    single: f32,
    double: f64,
    text: String,
    raw: Vec<u8>,
    #[cluon(type_name = "test.Inner")]
    inner: Inner,
}

#[derive(Debug, Default, PartialEq, Message)]
#[cluon(id = 42)]
struct Numbered {
    a: u8,
    #[cluon(id = 5)]
    b: u8,
    c: u8,
    #[cluon(id = 7, name = "renamed")]
    d: u8,
}

fn field_ids<M: Visitable>(message: &mut M) -> Vec<(u32, String)> {
    let mut ids = Vec::new();
    message.accept_with(
        |_, _, _| {},
        |f: FieldInfo<'_>, _| ids.push((f.id, f.name.to_string())),
        || {},
    );
    ids
}

#[test]
fn test_derive_numbering() {
    assert_eq!(
        field_ids(&mut Numbered::default()),
        vec![
            (1, "a".to_string()),
            (5, "b".to_string()),
            (2, "c".to_string()),
            (7, "renamed".to_string()),
        ]
    );
    assert_eq!(Numbered::ID, 42);
    assert_eq!(Numbered::LONG_NAME, "Numbered");
    assert_eq!(Everything::SHORT_NAME, "Everything");
    assert_eq!(Everything::LONG_NAME, "test.Everything");
}

#[test]
fn test_default_message_is_empty() {
    assert!(proto::encode(&mut Everything::default()).is_empty());
}

#[test]
fn test_char_beyond_one_byte_is_not_truncated() {
    let mut msg = Everything {
        letter: 'Ā',
        small: 1,
        ..Everything::default()
    };
    let mut encoder = cluon::ToProtoVisitor::new();
    msg.accept(&mut encoder);
    // U+0100 would read back as '\0' if cut to its low byte.
    assert_eq!(encoder.encoded_data(), &[0x20, 0x01]);
    assert_eq!(encoder.unencodable_fields(), 1);

    let mut decoded = Everything::default();
    assert!(proto::decode_into(encoder.encoded_data(), &mut decoded).is_clean());
    assert_eq!(decoded.letter, '\0');
    assert_eq!(decoded.small, 1);

    msg.letter = 'ÿ';
    let mut decoded = Everything::default();
    proto::decode_into(&proto::encode(&mut msg), &mut decoded);
    assert_eq!(decoded.letter, 'ÿ');
}

#[test]
fn test_scalar_vectors() {
    let mut msg = Everything {
        flag: true,
        tiny: -1,
        word: 300,
        long: -2,
        ulong: u64::MAX,
        ..Everything::default()
    };
    assert_eq!(
        proto::encode(&mut msg),
        vec![
            0x08, 0x01, // flag
            0x18, 0x01, // tiny = -1
            0x30, 0xAC, 0x02, // word = 300
            0x48, 0x03, // long = -2
            0x50, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, // ulong
        ]
    );
}

#[test]
fn test_fixed_and_length_delimited_vectors() {
    let mut msg = Everything {
        single: 1.0,
        double: -2.5,
        text: "ok".into(),
        raw: vec![0xDE, 0xAD],
        inner: Inner {
            code: 7,
            text: String::new(),
        },
        ..Everything::default()
    };
    assert_eq!(
        proto::encode(&mut msg),
        vec![
            0x5D, 0x00, 0x00, 0x80, 0x3F, // single, field 11
            0x61, 0, 0, 0, 0, 0, 0, 0x04, 0xC0, // double, field 12
            0x6A, 0x02, b'o', b'k', // text, field 13
            0x72, 0x02, 0xDE, 0xAD, // raw, field 14
            0x7A, 0x02, 0x08, 0x07, // inner, field 15
        ]
    );
}

#[test]
fn test_randomized_roundtrip() {
    let mut rng = fastrand::Rng::with_seed(0x0DA4);
    for _ in 0..200 {
        let mut original = Everything {
            flag: rng.bool(),
            letter: char::from(rng.u8(..)),
            tiny: rng.i8(..),
            small: rng.u8(..),
            short: rng.i16(..),
            word: rng.u16(..),
            int: rng.i32(..),
            uint: rng.u32(..),
            long: rng.i64(..),
            ulong: rng.u64(..),
            single: rng.f32() * 1000.0 - 500.0,
            double: rng.f64() * 1e9 - 5e8,
            text: (0..rng.usize(0..8)).map(|_| rng.alphanumeric()).collect(),
            raw: (0..rng.usize(0..8)).map(|_| rng.u8(..)).collect(),
            inner: Inner {
                code: rng.u16(..),
                text: (0..rng.usize(0..4)).map(|_| rng.lowercase()).collect(),
            },
        };

        let bytes = proto::encode(&mut original);
        let mut decoded = Everything::default();
        let diagnostics = proto::decode_into(&bytes, &mut decoded);
        assert!(diagnostics.is_clean(), "{:?}", diagnostics);
        assert_eq!(decoded, original);
    }
}

#[test]
fn test_decode_reordered_and_unknown_fields() {
    // inner first, then an unknown field 30, then flag
    let bytes = [0x7A, 0x02, 0x08, 0x07, 0xF0, 0x01, 0x05, 0x08, 0x01];
    let mut decoded = Everything::default();
    let diagnostics = proto::decode_into(&bytes, &mut decoded);

    assert!(decoded.flag);
    assert_eq!(decoded.inner.code, 7);
    assert_eq!(diagnostics.unknown_fields, 1);
    assert_eq!(diagnostics.malformed_frames, 0);
}

#[test]
fn test_truncated_input_keeps_prefix() {
    let mut full = Everything {
        small: 9,
        text: "truncated".into(),
        ..Everything::default()
    };
    let bytes = proto::encode(&mut full);

    let mut decoded = Everything::default();
    let diagnostics = proto::decode_into(&bytes[..bytes.len() - 3], &mut decoded);
    assert_eq!(decoded.small, 9);
    assert_eq!(decoded.text, "");
    assert_eq!(diagnostics.malformed_frames, 1);
}

#[test]
fn test_decode_overwrites_only_present_fields() {
    let mut target = Everything {
        word: 5,
        text: "keep".into(),
        ..Everything::default()
    };
    proto::decode_into(&[0x30, 0x06], &mut target);
    assert_eq!(target.word, 6);
    assert_eq!(target.text, "keep");
}
