// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Integration tests for the generic message module.

use super::*;
use crate::proto::{self, FromProtoVisitor};
use crate::schema::{DataType, MessageParser, MetaMessage};
use crate::visitor::{Decoder, FieldInfo, FieldMut, Visitable, Visitor, MAX_NESTING_DEPTH};

fn parse(spec: &str) -> Vec<MetaMessage> {
    MessageParser::new().parse_result(spec).expect("valid spec")
}

fn decode(schema: &[MetaMessage], index: usize, bytes: &[u8]) -> GenericMessage {
    let mut decoder = FromProtoVisitor::new();
    decoder.decode_from(bytes);
    GenericMessage::create_from_decoder(&schema[index], schema, &mut decoder)
}

/// `Node { v: 1 }` wrapped in `levels` nested `next` fields.
fn nested_nodes(levels: usize) -> Vec<u8> {
    let mut len = 2;
    let mut headers = Vec::with_capacity(levels);
    for _ in 0..levels {
        let mut header = vec![0x0A];
        proto::varint::write_varint(&mut header, len as u64);
        len += header.len();
        headers.push(header);
    }
    let mut data: Vec<u8> = headers.into_iter().rev().flatten().collect();
    data.extend_from_slice(&[0x10, 0x02]);
    data
}

fn chain_length(msg: &GenericMessage) -> usize {
    let mut length = 1;
    let mut node = msg;
    while let Some(next) = node.value(1).and_then(FieldValue::as_message) {
        length += 1;
        node = next;
    }
    length
}

#[derive(Debug, Default, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

impl Visitable for Position {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) {
        visitor.pre_visit(20, "Position", "geo.Position");
        visitor.visit(FieldInfo::new(1, "float", "x"), FieldMut::Float(&mut self.x));
        visitor.visit(FieldInfo::new(2, "float", "y"), FieldMut::Float(&mut self.y));
        visitor.post_visit();
    }
}

#[derive(Debug, Default, PartialEq)]
struct Vehicle {
    speed: u16,
    position: Position,
    label: String,
    heading: i32,
}

impl Visitable for Vehicle {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) {
        visitor.pre_visit(21, "Vehicle", "geo.Vehicle");
        visitor.visit(FieldInfo::new(1, "uint16", "speed"), FieldMut::Uint16(&mut self.speed));
        visitor.visit_message(FieldInfo::new(2, "geo.Position", "position"), &mut self.position);
        visitor.visit(FieldInfo::new(3, "string", "label"), FieldMut::String(&mut self.label));
        visitor.visit(FieldInfo::new(4, "int32", "heading"), FieldMut::Int32(&mut self.heading));
        visitor.post_visit();
    }
}

#[test]
fn test_decode_and_reencode() {
    let schema = parse("message T [id = 5] { uint8 a [id = 1]; string b [id = 2]; }");
    let bytes = [0x08, 0x07, 0x12, 0x02, b'h', b'i'];

    let mut msg = decode(&schema, 0, &bytes);
    assert_eq!(msg.message_identifier(), 5);
    assert_eq!(msg.value(1), Some(&FieldValue::Uint8(7)));
    assert_eq!(msg.value_by_name("b").and_then(FieldValue::as_str), Some("hi"));

    assert_eq!(proto::encode(&mut msg), bytes.to_vec());
}

#[test]
fn test_unknown_field_is_ignored() {
    let schema = parse("message T [id = 5] { uint8 a [id = 1]; string b [id = 2]; }");
    let mut msg = decode(&schema, 0, &[0x98, 0x06, 0x05, 0x08, 0x07]);

    assert_eq!(msg.get::<u8>("a").unwrap(), 7);
    assert_eq!(msg.get::<String>("b").unwrap(), "");
    assert_eq!(proto::encode(&mut msg), vec![0x08, 0x07]);
}

#[test]
fn test_nested_type_resolution() {
    let schema = parse(
        "package demo;
         message Inner [id = 2] { uint32 x [id = 1]; }
         message Outer [id = 1] { Inner inner [id = 1]; string s [id = 2]; }",
    );
    let bytes = [0x0A, 0x02, 0x08, 0x05, 0x12, 0x01, b'z'];

    let mut msg = decode(&schema, 1, &bytes);
    let inner = msg.value(1).and_then(FieldValue::as_message).expect("nested");
    assert_eq!(inner.long_name(), "demo.Inner");
    assert_eq!(inner.get::<u32>("x").unwrap(), 5);
    assert_eq!(msg.get::<String>("s").unwrap(), "z");

    assert_eq!(proto::encode(&mut msg), bytes.to_vec());
}

#[test]
fn test_default_message_from_schema() {
    let schema = parse(
        "message A [id = 1] { B b [id = 1]; double d [id = 2]; }
         message B [id = 2] { bool flag [id = 1]; }",
    );
    let mut msg = GenericMessage::create_from_schema(&schema[0], &schema);

    assert_eq!(msg.get::<f64>("d").unwrap(), 0.0);
    let nested = msg.value(1).and_then(FieldValue::as_message).expect("nested default");
    assert!(!nested.get::<bool>("flag").unwrap());
    assert!(proto::encode(&mut msg).is_empty());
}

#[test]
fn test_unresolved_nested_field_is_dropped() {
    let schema = parse("message A [id = 1] { Missing m [id = 1]; uint8 n [id = 2]; }");
    let mut msg = decode(&schema, 0, &[0x0A, 0x01, 0x08, 0x10, 0x03]);

    assert!(msg.value(1).is_none());
    assert_eq!(msg.meta_message().fields().len(), 2);
    assert_eq!(msg.get::<u8>("n").unwrap(), 3);
    assert_eq!(proto::encode(&mut msg), vec![0x10, 0x03]);
}

#[test]
fn test_recursive_schema_terminates() {
    let schema = parse("message Node [id = 3] { Node next [id = 1]; int32 v [id = 2]; }");

    let defaults = GenericMessage::create_from_schema(&schema[0], &schema);
    assert!(defaults.value(1).is_none());

    // Node { next: Node { v: -2 }, v: -1 }
    let msg = decode(&schema, 0, &[0x0A, 0x02, 0x10, 0x03, 0x10, 0x01]);
    assert_eq!(msg.get::<i32>("v").unwrap(), -1);
    let next = msg.value(1).and_then(FieldValue::as_message).expect("one level");
    assert_eq!(next.get::<i32>("v").unwrap(), -2);
    assert!(next.value(1).is_none());
}

#[test]
fn test_deep_recursive_input_stops_at_limit() {
    let schema = parse("message Node [id = 3] { Node next [id = 1]; int32 v [id = 2]; }");

    let shallow = decode(&schema, 0, &nested_nodes(5));
    assert_eq!(chain_length(&shallow), 6);

    let mut decoder = FromProtoVisitor::new();
    decoder.decode_from(&nested_nodes(20_000));
    let deep = GenericMessage::create_from_decoder(&schema[0], &schema, &mut decoder);

    assert_eq!(chain_length(&deep), MAX_NESTING_DEPTH);
    assert_eq!(decoder.diagnostics().malformed_frames, 1);
    assert_eq!(decoder.diagnostics().unknown_fields, 0);
}

#[test]
fn test_nested_diagnostics_reach_outer_decoder() {
    let schema = parse(
        "message I [id = 2] { uint8 a [id = 1]; }
         message O [id = 1] { I i [id = 1]; }",
    );
    // O { i: I { a: 1, <unknown field 9> } }
    let bytes = [0x0A, 0x04, 0x08, 0x01, 0x48, 0x02];

    let mut decoder = FromProtoVisitor::new();
    decoder.decode_from(&bytes);
    let msg = GenericMessage::create_from_decoder(&schema[1], &schema, &mut decoder);
    let inner = msg.value(1).and_then(FieldValue::as_message).expect("nested");
    assert_eq!(inner.get::<u8>("a").unwrap(), 1);
    assert_eq!(decoder.diagnostics().unknown_fields, 1);

    // Same count as decoding into the typed form.
    #[derive(Default)]
    struct I {
        a: u8,
    }
    impl Visitable for I {
        fn accept<V: Visitor>(&mut self, visitor: &mut V) {
            visitor.pre_visit(2, "I", "I");
            visitor.visit(FieldInfo::new(1, "uint8", "a"), FieldMut::Uint8(&mut self.a));
            visitor.post_visit();
        }
    }
    #[derive(Default)]
    struct O {
        i: I,
    }
    impl Visitable for O {
        fn accept<V: Visitor>(&mut self, visitor: &mut V) {
            visitor.pre_visit(1, "O", "O");
            visitor.visit_message(FieldInfo::new(1, "I", "i"), &mut self.i);
            visitor.post_visit();
        }
    }
    let typed = proto::decode_into(&bytes, &mut O::default());
    assert_eq!(typed, decoder.diagnostics());
}

#[test]
fn test_capture_typed_message() {
    let mut vehicle = Vehicle {
        speed: 80,
        position: Position { x: 1.5, y: -2.0 },
        label: "bus".into(),
        heading: -90,
    };

    let mut msg = GenericMessage::create_from(&mut vehicle);
    assert_eq!(msg.long_name(), "geo.Vehicle");
    assert_eq!(msg.short_name(), "Vehicle");
    assert_eq!(msg.meta_message().package_name, "geo");
    assert_eq!(msg.catalogue().len(), 2);

    let field = msg.meta_message().field_by_id(2).expect("position field");
    assert_eq!(field.data_type, DataType::Message);
    assert_eq!(field.data_type_name, "geo.Position");

    assert_eq!(proto::encode(&mut msg), proto::encode(&mut vehicle));
    let copy: Vehicle = msg.to_message();
    assert_eq!(copy, vehicle);
}

#[test]
fn test_copy_skips_type_mismatch() {
    let schema = parse("message P [id = 20] { string x [id = 1]; float y [id = 2]; }");
    let mut msg = GenericMessage::create_from_schema(&schema[0], &schema);
    msg.set("x", "not a float").unwrap();
    msg.set_value(2, 4.0f32).unwrap();

    let mut position = Position { x: 9.0, y: 0.0 };
    position.accept(&mut msg);
    assert_eq!(position, Position { x: 9.0, y: 4.0 });
}

#[test]
fn test_set_value_errors() {
    let schema = parse("message T [id = 5] { uint8 a [id = 1]; }");
    let mut msg = GenericMessage::create_from_schema(&schema[0], &schema);

    assert_eq!(
        msg.set_value(1, 7u16),
        Err(GenericMessageError::TypeMismatch {
            expected: DataType::Uint8,
            got: DataType::Uint16,
        })
    );
    assert_eq!(
        msg.set_value(9, 7u8),
        Err(GenericMessageError::FieldNotFound("9".into()))
    );
    assert!(msg.get::<bool>("a").is_err());
    assert_eq!(
        msg.get::<u8>("zz").unwrap_err().to_string(),
        "Field not found: zz"
    );
}

#[test]
fn test_fields_follow_schema_order() {
    let schema = parse("message T [id = 5] { uint8 b [id = 2]; uint8 a [id = 1]; }");
    let msg = GenericMessage::create_from_schema(&schema[0], &schema);
    let names: Vec<_> = msg.fields().map(|(f, _)| f.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}
