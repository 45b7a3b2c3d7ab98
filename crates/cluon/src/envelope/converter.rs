// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion between OD4 envelopes and JSON, driven by a message
//! specification loaded at runtime.

use super::{
    extract_envelope, serialize_envelope, Envelope, TimeStamp, OD4_HEADER_BYTE0,
    OD4_HEADER_BYTE1, OD4_HEADER_SIZE,
};
use crate::generic::GenericMessage;
use crate::json::{FromJsonVisitor, ToJsonVisitor};
use crate::proto::{self, FromProtoVisitor};
use crate::schema::{MessageParser, MetaMessage, ParseError};
use crate::visitor::{Decoder, Visitable};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Converter shared between threads.
pub type SharedEnvelopeConverter = Mutex<EnvelopeConverter>;

/// Translates envelopes to and from JSON for the messages of one
/// specification.
#[derive(Debug, Default)]
pub struct EnvelopeConverter {
    messages: Vec<MetaMessage>,
    by_identifier: HashMap<i32, usize>,
}

impl EnvelopeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known messages; returns how many were loaded.
    ///
    /// On a parse error the converter is left empty.
    pub fn set_message_specification(&mut self, spec: &str) -> Result<usize, ParseError> {
        self.messages.clear();
        self.by_identifier.clear();

        let messages = MessageParser::new().parse_result(spec).map_err(|e| {
            log::debug!("[envelope] rejected message specification: {}", e);
            e
        })?;
        for (index, message) in messages.iter().enumerate() {
            self.by_identifier.insert(message.message_identifier, index);
        }
        self.messages = messages;
        Ok(self.messages.len())
    }

    /// Loaded message specifications.
    pub fn message_specifications(&self) -> &[MetaMessage] {
        &self.messages
    }

    fn schema(&self, message_identifier: i32) -> Option<&MetaMessage> {
        self.by_identifier
            .get(&message_identifier)
            .and_then(|&i| self.messages.get(i))
    }

    /// JSON for an encoded envelope, with or without its OD4 header.
    ///
    /// Returns `{}` when nothing is loaded or the payload type is unknown.
    pub fn json_from_proto_encoded_envelope(&self, data: &[u8]) -> String {
        if self.messages.is_empty() {
            return "{}".to_string();
        }

        let mut envelope = Envelope::default();
        if data.len() > OD4_HEADER_SIZE
            && data[0] == OD4_HEADER_BYTE0
            && data[1] == OD4_HEADER_BYTE1
        {
            match extract_envelope(data) {
                Ok((framed, used)) if used == data.len() => envelope = framed,
                Ok(_) => log::debug!("[envelope] trailing bytes after OD4 frame"),
                Err(e) => log::debug!("[envelope] OD4 frame unusable: {}", e),
            }
        }
        if envelope.data_type == 0 {
            // Not a complete frame; try the bare envelope.
            proto::decode_into(data, &mut envelope);
        }

        self.json_from_envelope(&envelope)
    }

    /// JSON object of the envelope fields plus the decoded payload under
    /// the payload's message name, dots replaced by underscores.
    pub fn json_from_envelope(&self, envelope: &Envelope) -> String {
        let Some(schema) = self.schema(envelope.data_type) else {
            return "{}".to_string();
        };

        let mut envelope = envelope.clone();
        let mut envelope_json = ToJsonVisitor::with_mask(HashMap::from([(2, false)]));
        envelope.accept(&mut envelope_json);

        let mut decoder = FromProtoVisitor::new();
        decoder.decode_from(&envelope.serialized_data);
        let mut payload = GenericMessage::create_from_decoder(schema, &self.messages, &mut decoder);
        let mut payload_json = ToJsonVisitor::new();
        payload.accept(&mut payload_json);

        let mut object = match envelope_json.into_value() {
            Value::Object(object) => object,
            _ => serde_json::Map::new(),
        };
        object.insert(
            schema.message_name.replace('.', "_"),
            payload_json.into_value(),
        );
        Value::Object(object).to_string()
    }

    /// Build an OD4 frame whose payload is message `message_identifier`
    /// filled from `json`.
    ///
    /// Returns an empty buffer when the identifier is unknown or the
    /// payload is too large to frame.
    pub fn proto_encoded_envelope_from_json(
        &self,
        json: &str,
        message_identifier: i32,
        sender_stamp: u32,
        sample_time_stamp: TimeStamp,
    ) -> Vec<u8> {
        let Some(schema) = self.schema(message_identifier) else {
            log::debug!("[envelope] unknown message identifier {}", message_identifier);
            return Vec::new();
        };

        let mut decoder = FromJsonVisitor::from_json(json);
        let mut message = GenericMessage::create_from_decoder(schema, &self.messages, &mut decoder);

        let envelope = Envelope {
            data_type: message_identifier,
            serialized_data: proto::encode(&mut message),
            sample_time_stamp,
            sender_stamp,
            ..Envelope::default()
        };
        serialize_envelope(envelope).unwrap_or_else(|e| {
            log::warn!("[envelope] cannot frame message {}: {}", message_identifier, e);
            Vec::new()
        })
    }
}
