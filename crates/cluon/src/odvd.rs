// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ODVD text from a live message.

use crate::schema::{DataType, MetaMessage};
use crate::visitor::{FieldInfo, FieldMut, Visitable, Visitor};
use std::fmt::Write as _;

/// Visitor reconstructing the ODVD declaration of the message it walks.
///
/// Nested message types are declared once, ahead of their first user, so
/// [`message_specification`](Self::message_specification) parses back with
/// [`MessageParser`](crate::MessageParser).
#[derive(Debug, Default)]
pub struct ToOdvdVisitor {
    declarations: Vec<String>,
    buffer: String,
}

impl ToOdvdVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declarations of all nested types followed by the visited message.
    pub fn message_specification(&self) -> String {
        let mut spec = self.declarations.concat();
        spec.push_str(&self.buffer);
        spec
    }

    fn default_literal(data_type: DataType) -> &'static str {
        match data_type {
            DataType::Bool => "false",
            DataType::Char => "'0'",
            DataType::Float | DataType::Double => "0.0",
            DataType::String | DataType::Bytes => "\"\"",
            _ => "0",
        }
    }
}

impl Visitor for ToOdvdVisitor {
    fn pre_visit(&mut self, id: i32, _short_name: &str, long_name: &str) {
        if id > 0 {
            let _ = writeln!(self.buffer, "message {} [ id = {} ] {{", long_name, id);
        } else {
            let _ = writeln!(self.buffer, "message {} {{", long_name);
        }
    }

    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        let data_type = value.data_type();
        let _ = writeln!(
            self.buffer,
            "    {} {} [ default = {}, id = {} ];",
            data_type.type_token(),
            field.name,
            Self::default_literal(data_type),
            field.id
        );
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        let mut nested = ToOdvdVisitor::new();
        value.accept(&mut nested);

        for declaration in nested.declarations.into_iter().chain([nested.buffer]) {
            if !self.declarations.contains(&declaration) {
                self.declarations.push(declaration);
            }
        }

        let _ = writeln!(
            self.buffer,
            "    {} {} [ id = {} ];",
            field.type_name.replace("::", "."),
            field.name,
            field.id
        );
    }

    fn post_visit(&mut self) {
        self.buffer.push_str("}\n");
    }
}

/// Normalised ODVD text for parsed messages.
///
/// A package shared by every message is written once as a `package`
/// statement; otherwise messages carry their fully-qualified names. Default
/// values are kept as declared.
pub fn render_specification(messages: &[MetaMessage]) -> String {
    let shared_package = messages
        .first()
        .map(|m| m.package_name.as_str())
        .filter(|p| !p.is_empty() && messages.iter().all(|m| m.package_name == *p));

    let mut out = String::new();
    if let Some(package) = shared_package {
        let _ = writeln!(out, "package {};\n", package);
    }

    for message in messages {
        let name = match shared_package {
            Some(_) => message.message_name.clone(),
            None => message.long_name(),
        };
        if message.message_identifier > 0 {
            let _ = writeln!(out, "message {} [ id = {} ] {{", name, message.message_identifier);
        } else {
            let _ = writeln!(out, "message {} {{", name);
        }
        for field in message.fields() {
            match &field.default_value {
                Some(default) => {
                    let _ = writeln!(
                        out,
                        "    {} {} [ default = {}, id = {} ];",
                        field.data_type_name, field.name, default, field.identifier
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "    {} {} [ id = {} ];",
                        field.data_type_name, field.name, field.identifier
                    );
                }
            }
        }
        out.push_str("}\n\n");
    }
    out
}
