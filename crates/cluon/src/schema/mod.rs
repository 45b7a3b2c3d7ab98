// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message schemas: the ODVD parser and the descriptors it produces.

mod meta_message;
mod parser;

pub use meta_message::{DataType, MetaField, MetaMessage};
pub use parser::{MessageParser, MessageParserErrorCode, ParseError};
