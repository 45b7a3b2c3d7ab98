// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # cluon - message specifications and wire codecs
//!
//! Parses ODVD message specifications into runtime schemas, holds message
//! values generically and moves them through a protobuf-compatible binary
//! codec, JSON and back.
//!
//! ## Quick Start
//!
//! ```rust
//! use cluon::{FieldValue, GenericMessage, MessageParser, MessageParserErrorCode};
//!
//! let spec = r#"
//!     package demo;
//!     message Temperature [id = 1001] {
//!         float celsius [id = 1];
//!         string sensor [id = 2];
//!     }
//! "#;
//!
//! let (messages, code) = MessageParser::new().parse(spec);
//! assert_eq!(code, MessageParserErrorCode::NoError);
//! assert_eq!(messages[0].long_name(), "demo.Temperature");
//!
//! let mut reading = GenericMessage::create_from_schema(&messages[0], &messages);
//! reading.set_value(1, FieldValue::Float(21.5)).unwrap();
//! let bytes = cluon::proto::encode(&mut reading);
//! assert_eq!(bytes, vec![0x0D, 0x00, 0x00, 0xAC, 0x41]);
//! ```
//!
//! ## Typed messages
//!
//! ```rust
//! use cluon::{proto, Message};
//!
//! #[derive(Debug, Default, PartialEq, Message)]
//! #[cluon(id = 30, name = "demo.Counter")]
//! struct Counter {
//!     value: u32,
//!     #[cluon(id = 5)]
//!     label: String,
//! }
//!
//! let mut counter = Counter { value: 3, label: "a".into() };
//! let bytes = proto::encode(&mut counter);
//!
//! let mut decoded = Counter::default();
//! assert!(proto::decode_into(&bytes, &mut decoded).is_clean());
//! assert_eq!(decoded, counter);
//! ```
//!
//! ## Modules Overview
//!
//! - [`schema`] - ODVD parser, `MetaMessage` and `MetaField`
//! - [`visitor`] - Visitor protocol every codec is built on
//! - [`generic`] - Schema-driven message values
//! - [`proto`] - Binary wire codec
//! - `json` - JSON rendering and parsing (feature `json`)
//! - `csv` - One delimiter-separated row per message (feature `csv`)
//! - `msgpack` - MessagePack encoding and decoding (feature `msgpack`)
//! - [`odvd`] - ODVD text from a live message
//! - `transform` - `.proto` generation (feature `proto-gen`)
//! - [`envelope`] - OD4 envelope framing

// Allow the derive macro to work inside this crate's tests
extern crate self as cluon;

/// Delimiter-separated rows.
#[cfg(feature = "csv")]
pub mod csv;
/// OD4 envelopes, their framing and the JSON converter.
pub mod envelope;
/// GenericMessage, the schema-driven message value.
pub mod generic;
/// JSON visitors.
#[cfg(feature = "json")]
pub mod json;
/// MessagePack visitors.
#[cfg(feature = "msgpack")]
pub mod msgpack;
/// Schema introspection back to ODVD text.
pub mod odvd;
/// Protobuf-compatible binary codec.
pub mod proto;
/// Message specification parsing.
pub mod schema;
/// MetaMessage to `.proto` rendering.
#[cfg(feature = "proto-gen")]
pub mod transform;
/// Visitor protocol.
pub mod visitor;

pub use envelope::{extract_envelope, serialize_envelope, Envelope, EnvelopeError, TimeStamp};
#[cfg(feature = "json")]
pub use envelope::{EnvelopeConverter, SharedEnvelopeConverter};
pub use generic::{FieldValue, FromFieldValue, GenericMessage, GenericMessageError};
pub use odvd::ToOdvdVisitor;
pub use proto::{DecodeDiagnostics, FromProtoVisitor, ToProtoVisitor};
pub use schema::{DataType, MessageParser, MessageParserErrorCode, MetaField, MetaMessage, ParseError};
pub use visitor::{Decoder, FieldInfo, FieldMut, Message, Visitable, Visitor, MAX_NESTING_DEPTH};

#[cfg(feature = "csv")]
pub use csv::ToCsvVisitor;
#[cfg(feature = "json")]
pub use json::{FromJsonVisitor, ToJsonVisitor};
#[cfg(feature = "msgpack")]
pub use msgpack::{FromMsgPackVisitor, ToMsgPackVisitor};
#[cfg(feature = "proto-gen")]
pub use transform::MetaMessageToProtoTransformator;

// Derive macro (shares its name with the trait, like serde)
pub use cluon_derive::Message;
