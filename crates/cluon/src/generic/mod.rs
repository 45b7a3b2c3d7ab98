// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic messages
//!
//! Runtime message values described by a [`MetaMessage`](crate::MetaMessage)
//! instead of a compiled type. A GenericMessage is both [`Visitable`] and a
//! [`Visitor`], so it can be encoded, decoded and copied to or from typed
//! messages with any codec.
//!
//! # Construction
//!
//! - **create_from**: capture a typed message, schema included
//! - **create_from_schema**: default values for a parsed schema
//! - **create_from_decoder**: read each field from a primed [`Decoder`]
//!
//! # Example
//!
//! ```rust
//! use cluon::proto::FromProtoVisitor;
//! use cluon::{Decoder, GenericMessage, MessageParser};
//!
//! let schema = MessageParser::new()
//!     .parse_result("message T [id = 5] { uint8 a [id = 1]; string b [id = 2]; }")
//!     .unwrap();
//!
//! let mut decoder = FromProtoVisitor::new();
//! decoder.decode_from(&[0x08, 0x07, 0x12, 0x02, b'h', b'i']);
//! let msg = GenericMessage::create_from_decoder(&schema[0], &schema, &mut decoder);
//!
//! assert_eq!(msg.get::<u8>("a").unwrap(), 7);
//! assert_eq!(msg.get::<String>("b").unwrap(), "hi");
//! ```
//!
//! [`Visitable`]: crate::Visitable
//! [`Visitor`]: crate::Visitor
//! [`Decoder`]: crate::Decoder

mod generic_message;
mod value;

pub use generic_message::{GenericMessage, GenericMessageError};
pub use value::{FieldValue, FromFieldValue};

#[cfg(test)]
mod tests;
