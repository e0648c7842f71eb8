//! # Message And Payload
//!
//! A decoded header bundled with its payload, and the multipart-map
//! contract shared by requests and responses.

use std::collections::BTreeMap;

use ids_types::Message;
use serde::de::DeserializeOwned;

use crate::errors::{ParseError, PayloadTypeError};
use crate::serializer::InfomodelSerializer;
use crate::{HEADER_PART, PAYLOAD_PART};

/// Anything that can be rendered as named multipart parts.
pub trait MultipartMap {
    /// Returns the parts, keyed by part name.
    fn to_multipart_map(
        &self,
        serializer: &dyn InfomodelSerializer,
    ) -> Result<BTreeMap<String, String>, ParseError>;
}

/// Payload after resolution against the message kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The kind carries no payload.
    Empty,
    /// Free text (empty string when the part was absent).
    Text(String),
    /// A resource description.
    Resource(serde_json::Value),
    /// A connector self-description.
    Connector(serde_json::Value),
    /// A contract offer, request or agreement.
    Contract(serde_json::Value),
}

/// A typed header with its resolved payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageAndPayload {
    header: Message,
    payload: Payload,
    raw_payload: Option<String>,
}

impl MessageAndPayload {
    pub(crate) fn new(header: Message, payload: Payload, raw_payload: Option<String>) -> Self {
        Self {
            header,
            payload,
            raw_payload,
        }
    }

    /// Message header.
    pub fn header(&self) -> &Message {
        &self.header
    }

    /// Resolved payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Payload part exactly as received; `None` if the part was absent.
    pub fn raw_payload(&self) -> Option<&str> {
        self.raw_payload.as_deref()
    }

    /// Splits into header and raw payload.
    pub fn into_parts(self) -> (Message, Option<String>) {
        (self.header, self.raw_payload)
    }

    /// Reads the payload as `T`.
    ///
    /// Structured payloads are converted from their parsed JSON; text
    /// payloads are parsed as JSON first.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, PayloadTypeError> {
        let mismatch = |e: serde_json::Error| PayloadTypeError::Mismatch(e.to_string());
        match &self.payload {
            Payload::Empty => Err(PayloadTypeError::NoPayload),
            Payload::Text(text) => serde_json::from_str(text).map_err(mismatch),
            Payload::Resource(v) | Payload::Connector(v) | Payload::Contract(v) => {
                T::deserialize(v).map_err(mismatch)
            }
        }
    }
}

impl MultipartMap for MessageAndPayload {
    fn to_multipart_map(
        &self,
        serializer: &dyn InfomodelSerializer,
    ) -> Result<BTreeMap<String, String>, ParseError> {
        let mut map = BTreeMap::new();
        map.insert(HEADER_PART.to_string(), serializer.serialize(&self.header)?);
        if let Some(raw) = &self.raw_payload {
            map.insert(PAYLOAD_PART.to_string(), raw.clone());
        }
        Ok(map)
    }
}
