//! # Multipart HTTP Endpoint
//!
//! Framework-free mapping of an HTTP POST to the dispatcher. A web framework
//! only needs to pass the `Content-Type` header and the body in, and write
//! the [`HttpReply`] out.
//!
//! | Outcome                                  | Status |
//! |------------------------------------------|--------|
//! | Handled, or rejected with a rejection    | 200    |
//! | Handled with no response                 | 200, empty body |
//! | Body or header could not be parsed       | 400, uncorrelated rejection |
//! | Request is not multipart                 | 500    |
//! | Dispatch or response encoding failed     | 500    |

use std::sync::Arc;

use bytes::Bytes;
use ids_multipart::{decode, resolve_and_wrap, MultipartCodec, MultipartMap, ParseError};
use ids_types::RejectionReason;
use tracing::{error, warn};

use crate::domain::response::MessageResponse;
use crate::payload::MessagePayload;
use crate::service::MessageDispatcher;

/// Status code for handled requests and protocol rejections.
pub const STATUS_OK: u16 = 200;
/// Status code for unparseable requests.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// Status code for transport-level failures.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Explanation sent when an inbound message cannot be parsed. The parse
/// error itself is only logged.
pub const MALFORMED_EXPLANATION: &str = "Message could not be parsed.";

/// Transport-level reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, absent for empty bodies.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpReply {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Bytes::new(),
        }
    }

    fn text(status: u16, text: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: Bytes::copy_from_slice(text.as_bytes()),
        }
    }
}

/// Multipart endpoint serving one dispatcher.
pub struct MultipartEndpoint {
    dispatcher: Arc<MessageDispatcher>,
    codec: MultipartCodec,
}

impl MultipartEndpoint {
    /// Creates an endpoint.
    pub fn new(dispatcher: Arc<MessageDispatcher>, codec: MultipartCodec) -> Self {
        Self { dispatcher, codec }
    }

    /// Handles one POST request.
    pub async fn handle(&self, content_type: &str, body: &[u8]) -> HttpReply {
        if !is_multipart(content_type) {
            warn!(content_type, "Rejecting non-multipart request");
            return HttpReply::text(STATUS_INTERNAL_ERROR, "Request is not multipart/form-data");
        }

        let inbound = match decode(body)
            .and_then(|parts| resolve_and_wrap(&parts, self.codec.serializer()))
        {
            Ok(inbound) => inbound,
            Err(e) => return self.malformed(&e),
        };

        let (header, raw_payload) = inbound.into_parts();
        match self
            .dispatcher
            .process(header, MessagePayload::from(raw_payload))
            .await
        {
            Ok(response) => self.render(STATUS_OK, &response),
            Err(e) => {
                error!(error = %e, "Dispatch failed");
                HttpReply::text(STATUS_INTERNAL_ERROR, "Message dispatch failed")
            }
        }
    }

    fn malformed(&self, cause: &ParseError) -> HttpReply {
        warn!(error = %cause, "Could not parse inbound message");
        let rejection = self
            .dispatcher
            .responses()
            .rejection_uncorrelated(RejectionReason::MalformedMessage, MALFORMED_EXPLANATION);
        match rejection {
            Ok(rejection) => self.render(STATUS_BAD_REQUEST, &MessageResponse::Error(rejection)),
            Err(e) => {
                error!(error = %e, "Could not build rejection for malformed message");
                HttpReply::empty(STATUS_BAD_REQUEST)
            }
        }
    }

    fn render(&self, status: u16, response: &MessageResponse) -> HttpReply {
        if matches!(response, MessageResponse::NoResponse) {
            return HttpReply::empty(status);
        }
        match response.to_multipart_map(self.codec.serializer()) {
            Ok(map) => {
                let encoded = self.codec.encode_map(&map);
                HttpReply {
                    status,
                    content_type: Some(encoded.content_type()),
                    body: encoded.into_bytes(),
                }
            }
            Err(e) => {
                error!(error = %e, "Could not encode response");
                HttpReply::empty(STATUS_INTERNAL_ERROR)
            }
        }
    }
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case("multipart/form-data"))
        .unwrap_or(false)
}
