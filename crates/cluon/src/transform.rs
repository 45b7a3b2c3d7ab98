// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proto2 schema generation from parsed message specifications.
//!
//! Dotted names are flattened with underscores, so `demo.sensors.Reading`
//! becomes the proto message `demo_sensors_Reading`. Narrow integers widen
//! to their 32-bit proto counterparts, signed ones using zig-zag types.

use crate::schema::{DataType, MetaMessage};
use serde::Serialize;
use tera::Tera;

const PROTO2_TEMPLATE: &str = r#"//
// THIS IS AN AUTO-GENERATED FILE. DO NOT MODIFY AS CHANGES MIGHT BE OVERWRITTEN!
//
{% if proto_header %}
// This line is only needed when using Google Protobuf 3.
syntax = "proto2";
{% endif %}
// Message identifier: {{ message.identifier }}.
message {{ message.name }} {
{%- for field in message.fields %}
    optional {{ field.proto_type }} {{ field.name }} = {{ field.identifier }};
{%- endfor %}
}
"#;

#[derive(Debug, Clone, Default, Serialize)]
struct ProtoField {
    proto_type: String,
    name: String,
    identifier: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
struct ProtoMessage {
    identifier: i32,
    name: String,
    fields: Vec<ProtoField>,
}

/// Proto type for a primitive data type.
fn proto_scalar(data_type: DataType) -> Option<&'static str> {
    let proto = match data_type {
        DataType::Bool => "bool",
        DataType::Char | DataType::Int8 | DataType::Int16 | DataType::Int32 => "sint32",
        DataType::Uint8 | DataType::Uint16 | DataType::Uint32 => "uint32",
        DataType::Int64 => "sint64",
        DataType::Uint64 => "uint64",
        DataType::Float => "float",
        DataType::Double => "double",
        DataType::String => "string",
        DataType::Bytes => "bytes",
        DataType::Message | DataType::Undefined => return None,
    };
    Some(proto)
}

/// Renders one MetaMessage at a time as a proto2 message.
pub struct MetaMessageToProtoTransformator {
    tera: Tera,
    message: ProtoMessage,
}

impl MetaMessageToProtoTransformator {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("proto2", PROTO2_TEMPLATE)?;
        Ok(Self {
            tera,
            message: ProtoMessage::default(),
        })
    }

    /// Select the message rendered by [`content`](Self::content).
    pub fn visit(&mut self, meta_message: &MetaMessage) {
        let package = meta_message.package_name.replace('.', "_");

        let fields = meta_message
            .fields()
            .iter()
            .map(|f| {
                let proto_type = match proto_scalar(f.data_type) {
                    Some(t) => t.to_string(),
                    None if package.is_empty() => f.data_type_name.replace('.', "_"),
                    None => format!("{}_{}", package, f.data_type_name.replace('.', "_")),
                };
                ProtoField {
                    proto_type,
                    name: f.name.replace('.', "_"),
                    identifier: f.identifier,
                }
            })
            .collect();

        self.message = ProtoMessage {
            identifier: meta_message.message_identifier,
            name: meta_message.long_name().replace('.', "_"),
            fields,
        };
    }

    /// Proto text of the selected message, optionally with the
    /// `syntax = "proto2";` header.
    pub fn content(&self, with_proto_header: bool) -> tera::Result<String> {
        let mut ctx = tera::Context::new();
        ctx.insert("proto_header", &with_proto_header);
        ctx.insert("message", &self.message);
        self.tera.render("proto2", &ctx)
    }

    /// Render every message, with the header on the first one only.
    pub fn render_all(&mut self, messages: &[MetaMessage]) -> tera::Result<String> {
        let mut out = String::new();
        for (index, message) in messages.iter().enumerate() {
            self.visit(message);
            out.push_str(&self.content(index == 0)?);
            out.push('\n');
        }
        Ok(out)
    }
}
