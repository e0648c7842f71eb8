//! # Kind Resolution
//!
//! The single table coupling wire discriminators to payload shapes.
//!
//! [`PayloadShape::for_kind`] is an exhaustive match over [`MessageKind`]:
//! adding a kind without choosing its shape does not compile. Subtypes are
//! listed with their own shape (a contract rejection is matched as itself,
//! never as a generic rejection).

use std::collections::BTreeMap;

use ids_types::MessageKind;
use tracing::debug;

use crate::errors::ParseError;
use crate::map::{MessageAndPayload, Payload};
use crate::serializer::InfomodelSerializer;
use crate::{HEADER_PART, PAYLOAD_PART};

/// Shape of the payload a message kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    /// No payload; a payload part is ignored.
    Empty,
    /// Free text.
    Text,
    /// JSON resource description.
    Resource,
    /// JSON connector self-description.
    Connector,
    /// JSON contract.
    Contract,
}

impl PayloadShape {
    /// Payload shape of `kind`.
    pub fn for_kind(kind: MessageKind) -> Self {
        match kind {
            MessageKind::DescriptionRequest
            | MessageKind::ArtifactRequest
            | MessageKind::MessageProcessedNotification => Self::Empty,

            MessageKind::Request
            | MessageKind::Notification
            | MessageKind::Response
            | MessageKind::ArtifactResponse
            | MessageKind::ContractRejection
            | MessageKind::Rejection
            | MessageKind::Query
            | MessageKind::Result => Self::Text,

            MessageKind::ResourceUpdate | MessageKind::ResourceUnavailable => Self::Resource,

            MessageKind::DescriptionResponse
            | MessageKind::ConnectorUpdate
            | MessageKind::ConnectorUnavailable => Self::Connector,

            MessageKind::ContractRequest
            | MessageKind::ContractResponse
            | MessageKind::ContractAgreement => Self::Contract,
        }
    }

    /// Returns true for shapes parsed as JSON.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Resource | Self::Connector | Self::Contract)
    }
}

/// Deserializes the `header` part and wraps it with its payload.
///
/// # Errors
///
/// - `MissingHeader` if there is no `header` part
/// - `UnsupportedType` if `@type` names no known kind
/// - `InvalidHeader` if the header does not deserialize
/// - `InvalidPayload` if a structured shape is missing or not valid JSON
pub fn resolve_and_wrap(
    parts: &BTreeMap<String, String>,
    serializer: &dyn InfomodelSerializer,
) -> Result<MessageAndPayload, ParseError> {
    let header_text = parts.get(HEADER_PART).ok_or(ParseError::MissingHeader)?;
    let header = serializer.deserialize(header_text)?;
    let kind = header.kind();
    let raw = parts.get(PAYLOAD_PART).cloned();
    let shape = PayloadShape::for_kind(kind);

    let payload = match shape {
        PayloadShape::Empty => Payload::Empty,
        PayloadShape::Text => Payload::Text(raw.clone().unwrap_or_default()),
        PayloadShape::Resource | PayloadShape::Connector | PayloadShape::Contract => {
            let text = raw.as_deref().ok_or_else(|| ParseError::InvalidPayload {
                kind,
                reason: "payload part missing".to_string(),
            })?;
            let value: serde_json::Value =
                serde_json::from_str(text).map_err(|e| ParseError::InvalidPayload {
                    kind,
                    reason: e.to_string(),
                })?;
            match shape {
                PayloadShape::Resource => Payload::Resource(value),
                PayloadShape::Connector => Payload::Connector(value),
                _ => Payload::Contract(value),
            }
        }
    };

    debug!(kind = %kind, shape = ?shape, "Resolved inbound message");
    Ok(MessageAndPayload::new(header, payload, raw))
}

/// Checks that every known kind resolves to a shape consistent with its
/// category. Run once at startup.
pub fn verify_resolution_table() -> Result<(), String> {
    for kind in MessageKind::ALL {
        let shape = PayloadShape::for_kind(kind);
        if kind.is_rejection() && shape != PayloadShape::Text {
            return Err(format!("{kind} must carry a text payload, resolves to {shape:?}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, MultipartCodec};
    use crate::serializer::JsonLdSerializer;
    use ids_types::{Message, RejectionReason};
    use std::collections::HashSet;
    use std::sync::Arc;
    use url::Url;

    fn message(kind: MessageKind) -> Message {
        let mut builder = Message::builder(kind)
            .issuer_connector(Url::parse("https://provider.example.org").unwrap())
            .sender_agent(Url::parse("https://provider.example.org/agent").unwrap());
        if kind.is_rejection() {
            builder = builder.rejection_reason(RejectionReason::NotFound);
        }
        builder.build().unwrap()
    }

    fn parts_for(kind: MessageKind, payload: Option<&str>) -> BTreeMap<String, String> {
        let codec = MultipartCodec::new(Arc::new(JsonLdSerializer::new()));
        let body = codec.encode(&message(kind), payload).unwrap();
        decode(body.body()).unwrap()
    }

    #[test]
    fn test_resolution_table_is_consistent() {
        assert_eq!(verify_resolution_table(), Ok(()));
    }

    #[test]
    fn test_every_shape_is_reachable() {
        let shapes: HashSet<_> = MessageKind::ALL
            .iter()
            .map(|k| PayloadShape::for_kind(*k))
            .collect();
        assert_eq!(shapes.len(), 5);
    }

    #[test]
    fn test_subtype_resolves_as_itself() {
        let parts = parts_for(MessageKind::ContractRejection, Some("no deal"));
        let map = resolve_and_wrap(&parts, &JsonLdSerializer::new()).unwrap();

        assert_eq!(map.header().kind(), MessageKind::ContractRejection);
        assert_eq!(map.payload(), &Payload::Text("no deal".to_string()));
    }

    #[test]
    fn test_missing_header_part() {
        let mut parts = BTreeMap::new();
        parts.insert(PAYLOAD_PART.to_string(), "x".to_string());
        assert_eq!(
            resolve_and_wrap(&parts, &JsonLdSerializer::new()),
            Err(ParseError::MissingHeader)
        );
    }

    #[test]
    fn test_absent_text_payload_is_empty_string() {
        let parts = parts_for(MessageKind::Request, None);
        let map = resolve_and_wrap(&parts, &JsonLdSerializer::new()).unwrap();

        assert_eq!(map.payload(), &Payload::Text(String::new()));
        assert_eq!(map.raw_payload(), None);
    }

    #[test]
    fn test_structured_payload_parsed() {
        let contract = r#"{"@type":"ids:ContractRequest","ids:permission":[]}"#;
        let parts = parts_for(MessageKind::ContractRequest, Some(contract));
        let map = resolve_and_wrap(&parts, &JsonLdSerializer::new()).unwrap();

        let value: serde_json::Value = map.payload_as().unwrap();
        assert_eq!(value["@type"], "ids:ContractRequest");
        assert!(matches!(map.payload(), Payload::Contract(_)));
    }

    #[test]
    fn test_structured_payload_must_be_json() {
        let parts = parts_for(MessageKind::ConnectorUpdate, Some("not json"));
        assert!(matches!(
            resolve_and_wrap(&parts, &JsonLdSerializer::new()),
            Err(ParseError::InvalidPayload { kind: MessageKind::ConnectorUpdate, .. })
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut parts = parts_for(MessageKind::Request, None);
        let header = parts[HEADER_PART].replace("ids:RequestMessage", "ids:UnknownMessage");
        parts.insert(HEADER_PART.to_string(), header);

        assert_eq!(
            resolve_and_wrap(&parts, &JsonLdSerializer::new()),
            Err(ParseError::UnsupportedType("ids:UnknownMessage".to_string()))
        );
    }
}
