//! # Responses
//!
//! What a handler (or the dispatcher itself) answers with. Every variant
//! renders to named multipart parts through [`MultipartMap`].

use std::collections::BTreeMap;

use ids_multipart::{InfomodelSerializer, MultipartMap, ParseError, HEADER_PART, PAYLOAD_PART};
use ids_types::{Message, RejectionReason};

/// A successful response header with an optional payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyResponse {
    header: Message,
    payload: Option<String>,
}

impl BodyResponse {
    /// Creates a response. `None` omits the payload part.
    pub fn new(header: Message, payload: Option<String>) -> Self {
        Self { header, payload }
    }

    /// Response header.
    pub fn header(&self) -> &Message {
        &self.header
    }

    /// Response payload.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// A rejection with its explanation.
///
/// Only built through [`crate::ResponseBuilder`], so the header is always a
/// rejection kind with a reason.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    header: Message,
    explanation: String,
}

impl ErrorResponse {
    pub(crate) fn new(header: Message, explanation: String) -> Self {
        Self {
            header,
            explanation,
        }
    }

    /// Rejection header.
    pub fn header(&self) -> &Message {
        &self.header
    }

    /// Reason code of the rejection.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        self.header.rejection_reason()
    }

    /// Free-text explanation sent as payload.
    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

/// Outcome of processing a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageResponse {
    /// Header plus optional payload.
    Body(BodyResponse),
    /// Structured rejection.
    Error(ErrorResponse),
    /// Pre-rendered parts.
    Multipart(BTreeMap<String, String>),
    /// Valid success without a body.
    NoResponse,
}

impl MessageResponse {
    /// Returns true for rejections.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Reason code if this is a rejection.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            Self::Error(e) => e.rejection_reason(),
            _ => None,
        }
    }

    /// Response header, if the variant carries a typed one.
    pub fn header(&self) -> Option<&Message> {
        match self {
            Self::Body(b) => Some(b.header()),
            Self::Error(e) => Some(e.header()),
            Self::Multipart(_) | Self::NoResponse => None,
        }
    }
}

impl From<BodyResponse> for MessageResponse {
    fn from(response: BodyResponse) -> Self {
        Self::Body(response)
    }
}

impl From<ErrorResponse> for MessageResponse {
    fn from(response: ErrorResponse) -> Self {
        Self::Error(response)
    }
}

impl MultipartMap for MessageResponse {
    fn to_multipart_map(
        &self,
        serializer: &dyn InfomodelSerializer,
    ) -> Result<BTreeMap<String, String>, ParseError> {
        let mut map = BTreeMap::new();
        match self {
            Self::Body(body) => {
                map.insert(HEADER_PART.to_string(), serializer.serialize(body.header())?);
                if let Some(payload) = body.payload() {
                    map.insert(PAYLOAD_PART.to_string(), payload.to_string());
                }
            }
            Self::Error(error) => {
                map.insert(HEADER_PART.to_string(), serializer.serialize(error.header())?);
                map.insert(PAYLOAD_PART.to_string(), error.explanation().to_string());
            }
            Self::Multipart(parts) => map = parts.clone(),
            Self::NoResponse => {}
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ids_multipart::JsonLdSerializer;
    use ids_types::MessageKind;
    use url::Url;

    fn header(kind: MessageKind) -> Message {
        Message::builder(kind)
            .issuer_connector(Url::parse("https://provider.example.org").unwrap())
            .sender_agent(Url::parse("https://provider.example.org/agent").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_body_without_payload_has_only_header() {
        let response = MessageResponse::from(BodyResponse::new(header(MessageKind::Response), None));
        let map = response.to_multipart_map(&JsonLdSerializer::new()).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["header"]);
    }

    #[test]
    fn test_body_with_empty_payload_keeps_part() {
        let response = MessageResponse::from(BodyResponse::new(
            header(MessageKind::Response),
            Some(String::new()),
        ));
        let map = response.to_multipart_map(&JsonLdSerializer::new()).unwrap();
        assert_eq!(map.get(PAYLOAD_PART).map(String::as_str), Some(""));
    }

    #[test]
    fn test_no_response_renders_nothing() {
        let map = MessageResponse::NoResponse
            .to_multipart_map(&JsonLdSerializer::new())
            .unwrap();
        assert!(map.is_empty());
        assert!(!MessageResponse::NoResponse.is_rejection());
    }
}
