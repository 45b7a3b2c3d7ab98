// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GenericMessage container for schema-described values.

use super::{FieldValue, FromFieldValue};
use crate::schema::{DataType, MetaField, MetaMessage};
use crate::visitor::{Decoder, FieldInfo, FieldMut, Visitable, Visitor, MAX_NESTING_DEPTH};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Errors for GenericMessage operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericMessageError {
    FieldNotFound(String),
    TypeMismatch { expected: DataType, got: DataType },
}

impl fmt::Display for GenericMessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotFound(field) => write!(f, "Field not found: {}", field),
            Self::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for GenericMessageError {}

/// Every schema known while building a message, shared by its nested parts.
#[derive(Debug, Default)]
struct Catalogue {
    messages: Vec<MetaMessage>,
    by_long_name: HashMap<String, usize>,
}

impl Catalogue {
    fn new(messages: &[MetaMessage]) -> Self {
        let mut by_long_name = HashMap::new();
        for (index, msg) in messages.iter().enumerate() {
            by_long_name.entry(msg.long_name()).or_insert(index);
        }
        Self {
            messages: messages.to_vec(),
            by_long_name,
        }
    }

    /// Resolve a field's type name: fully-qualified, then relative to
    /// `package`, then by bare message name.
    fn resolve(&self, type_name: &str, package: &str) -> Option<&MetaMessage> {
        let index = self.by_long_name.get(type_name).or_else(|| {
            if package.is_empty() {
                None
            } else {
                self.by_long_name.get(&format!("{}.{}", package, type_name))
            }
        });
        match index {
            Some(&i) => self.messages.get(i),
            None => self.messages.iter().find(|m| m.message_name == type_name),
        }
    }
}

/// Runtime value of any schema-described message.
///
/// Values are keyed by field identifier. A field without an entry is
/// skipped when the message is visited.
#[derive(Debug, Clone, Default)]
pub struct GenericMessage {
    meta_message: MetaMessage,
    long_name: String,
    catalogue: Arc<Catalogue>,
    values: HashMap<u32, FieldValue>,
}

impl GenericMessage {
    /// Capture a typed message, converting nested messages recursively.
    pub fn create_from<M: Visitable>(message: &mut M) -> Self {
        let mut capture = MessageCapture::default();
        message.accept(&mut capture);
        capture.finish()
    }

    /// Default-valued message for `schema`; nested fields are resolved in
    /// `catalogue` and silently dropped when unknown.
    pub fn create_from_schema(schema: &MetaMessage, catalogue: &[MetaMessage]) -> Self {
        let catalogue = Arc::new(Catalogue::new(catalogue));
        let mut path = Vec::new();
        Self::with_defaults(schema, &catalogue, &mut path)
    }

    /// Message for `schema` with every field read from a primed `decoder`.
    ///
    /// A nested field is read as bytes, which prime a fresh decoder for the
    /// nested message. What the nested decoders record is folded back into
    /// `decoder`; messages nested deeper than
    /// [`MAX_NESTING_DEPTH`](crate::visitor::MAX_NESTING_DEPTH) stay unset.
    pub fn create_from_decoder<D: Decoder>(
        schema: &MetaMessage,
        catalogue: &[MetaMessage],
        decoder: &mut D,
    ) -> Self {
        let catalogue = Arc::new(Catalogue::new(catalogue));
        let mut path = Vec::new();
        Self::decode_with(schema, &catalogue, decoder, &mut path)
    }

    fn empty(schema: &MetaMessage, catalogue: &Arc<Catalogue>) -> Self {
        Self {
            meta_message: schema.clone(),
            long_name: schema.long_name(),
            catalogue: Arc::clone(catalogue),
            values: HashMap::new(),
        }
    }

    fn with_defaults(
        schema: &MetaMessage,
        catalogue: &Arc<Catalogue>,
        path: &mut Vec<String>,
    ) -> Self {
        let mut msg = Self::empty(schema, catalogue);
        path.push(msg.long_name.clone());

        for field in schema.fields() {
            if let Some(value) = FieldValue::default_for(field.data_type) {
                msg.values.insert(field.identifier, value);
                continue;
            }
            let Some(nested_schema) = msg.resolve_nested(field) else {
                continue;
            };
            // A message type containing itself has no finite default.
            if path.contains(&nested_schema.long_name()) {
                log::debug!(
                    "[generic] '{}.{}' is recursive, left unset",
                    msg.long_name,
                    field.name
                );
                continue;
            }
            let nested = Self::with_defaults(&nested_schema, catalogue, path);
            msg.values.insert(field.identifier, nested.into());
        }

        path.pop();
        msg
    }

    fn decode_with<D: Decoder>(
        schema: &MetaMessage,
        catalogue: &Arc<Catalogue>,
        decoder: &mut D,
        path: &mut Vec<String>,
    ) -> Self {
        let mut msg = Self::empty(schema, catalogue);
        path.push(msg.long_name.clone());
        decoder.pre_visit(
            schema.message_identifier,
            schema.short_name(),
            &msg.long_name,
        );

        for field in schema.fields() {
            let info = FieldInfo::new(field.identifier, &field.data_type_name, &field.name);

            if let Some(mut value) = FieldValue::default_for(field.data_type) {
                if let Some(target) = value.as_field_mut() {
                    decoder.visit(info, target);
                }
                msg.values.insert(field.identifier, value);
                continue;
            }

            let Some(nested_schema) = msg.resolve_nested(field) else {
                continue;
            };
            let mut bytes = Vec::new();
            decoder.visit(info, FieldMut::Bytes(&mut bytes));
            // Recursion only continues while there is data to consume.
            if bytes.is_empty() && path.contains(&nested_schema.long_name()) {
                continue;
            }
            if path.len() >= MAX_NESTING_DEPTH {
                if !bytes.is_empty() {
                    decoder.nesting_limit_reached(info);
                }
                continue;
            }
            let mut nested_decoder = D::default();
            nested_decoder.decode_from(&bytes);
            let nested = Self::decode_with(&nested_schema, catalogue, &mut nested_decoder, path);
            decoder.absorb(&nested_decoder);
            msg.values.insert(field.identifier, nested.into());
        }

        decoder.post_visit();
        path.pop();
        msg
    }

    fn resolve_nested(&self, field: &MetaField) -> Option<MetaMessage> {
        if field.data_type != DataType::Message {
            return None;
        }
        let resolved = self
            .catalogue
            .resolve(&field.data_type_name, &self.meta_message.package_name)
            .cloned();
        if resolved.is_none() {
            log::debug!(
                "[generic] dropping '{}.{}': unknown type '{}'",
                self.long_name,
                field.name,
                field.data_type_name
            );
        }
        resolved
    }

    /// Schema of this message.
    pub fn meta_message(&self) -> &MetaMessage {
        &self.meta_message
    }

    /// Every schema visible to this message.
    pub fn catalogue(&self) -> &[MetaMessage] {
        &self.catalogue.messages
    }

    pub fn message_identifier(&self) -> i32 {
        self.meta_message.message_identifier
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn short_name(&self) -> &str {
        self.meta_message.short_name()
    }

    /// Value of a field by identifier.
    pub fn value(&self, identifier: u32) -> Option<&FieldValue> {
        self.values.get(&identifier)
    }

    /// Mutable value of a field by identifier.
    pub fn value_mut(&mut self, identifier: u32) -> Option<&mut FieldValue> {
        self.values.get_mut(&identifier)
    }

    /// Value of a field by name.
    pub fn value_by_name(&self, name: &str) -> Option<&FieldValue> {
        let field = self.meta_message.field_by_name(name)?;
        self.values.get(&field.identifier)
    }

    /// Typed value of a field by name.
    pub fn get<T: FromFieldValue>(&self, name: &str) -> Result<T, GenericMessageError> {
        let field = self
            .meta_message
            .field_by_name(name)
            .ok_or_else(|| GenericMessageError::FieldNotFound(name.to_string()))?;
        let value = self
            .values
            .get(&field.identifier)
            .ok_or_else(|| GenericMessageError::FieldNotFound(name.to_string()))?;
        T::from_field_value(value).ok_or(GenericMessageError::TypeMismatch {
            expected: field.data_type,
            got: value.data_type(),
        })
    }

    /// Set a field value by identifier; the type must match the schema.
    pub fn set_value(
        &mut self,
        identifier: u32,
        value: impl Into<FieldValue>,
    ) -> Result<(), GenericMessageError> {
        let field = self
            .meta_message
            .field_by_id(identifier)
            .ok_or_else(|| GenericMessageError::FieldNotFound(identifier.to_string()))?;
        let value = value.into();
        if value.data_type() != field.data_type {
            return Err(GenericMessageError::TypeMismatch {
                expected: field.data_type,
                got: value.data_type(),
            });
        }
        self.values.insert(identifier, value);
        Ok(())
    }

    /// Set a field value by name.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), GenericMessageError> {
        let identifier = self
            .meta_message
            .field_by_name(name)
            .map(|f| f.identifier)
            .ok_or_else(|| GenericMessageError::FieldNotFound(name.to_string()))?;
        self.set_value(identifier, value)
    }

    /// Iterate over present fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&MetaField, &FieldValue)> {
        self.meta_message
            .fields()
            .iter()
            .filter_map(|f| self.values.get(&f.identifier).map(|v| (f, v)))
    }

    /// Copy the held values into a fresh typed message.
    pub fn to_message<M: Visitable + Default>(&mut self) -> M {
        let mut message = M::default();
        message.accept(self);
        message
    }
}

impl PartialEq for GenericMessage {
    fn eq(&self, other: &Self) -> bool {
        self.meta_message == other.meta_message && self.values == other.values
    }
}

impl Visitable for GenericMessage {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) {
        visitor.pre_visit(
            self.meta_message.message_identifier,
            self.meta_message.short_name(),
            &self.long_name,
        );

        for field in self.meta_message.fields() {
            let Some(value) = self.values.get_mut(&field.identifier) else {
                continue;
            };
            let info = FieldInfo::new(field.identifier, &field.data_type_name, &field.name);
            match value {
                FieldValue::Message(nested) => visitor.visit_message(info, &mut **nested),
                scalar => {
                    if let Some(target) = scalar.as_field_mut() {
                        visitor.visit(info, target);
                    }
                }
            }
        }

        visitor.post_visit();
    }
}

/// Copies held values into the visited message, matching by identifier.
impl Visitor for GenericMessage {
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        if let Some(stored) = self.values.get(&field.id) {
            // A type mismatch leaves the target as it was.
            stored.copy_into(value);
        }
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        if let Some(FieldValue::Message(nested)) = self.values.get_mut(&field.id) {
            value.accept(&mut **nested);
        }
    }
}

/// Builds a GenericMessage from the fields a typed message shows it.
#[derive(Default)]
struct MessageCapture {
    meta_message: MetaMessage,
    long_name: String,
    values: HashMap<u32, FieldValue>,
    nested_schemas: Vec<MetaMessage>,
}

impl MessageCapture {
    fn finish(self) -> GenericMessage {
        let mut schemas = vec![self.meta_message.clone()];
        for schema in self.nested_schemas {
            if !schemas.iter().any(|s| s.long_name() == schema.long_name()) {
                schemas.push(schema);
            }
        }
        GenericMessage {
            meta_message: self.meta_message,
            long_name: self.long_name,
            catalogue: Arc::new(Catalogue::new(&schemas)),
            values: self.values,
        }
    }
}

impl Visitor for MessageCapture {
    fn pre_visit(&mut self, id: i32, short_name: &str, long_name: &str) {
        let package = long_name
            .strip_suffix(short_name)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .unwrap_or("");
        let message_name = if package.is_empty() {
            long_name
        } else {
            short_name
        };
        self.meta_message = MetaMessage::new(package, message_name, id);
        self.long_name = long_name.to_string();
    }

    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        self.meta_message.add(MetaField {
            data_type: value.data_type(),
            data_type_name: field.type_name.to_string(),
            name: field.name.to_string(),
            identifier: field.id,
            default_value: None,
        });
        self.values.insert(field.id, value.into());
    }

    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M) {
        let nested = GenericMessage::create_from(value);
        self.nested_schemas
            .extend(nested.catalogue().iter().cloned());
        self.meta_message
            .add(MetaField::message(field.type_name, field.name, field.id));
        self.values.insert(field.id, nested.into());
    }
}
