//! # Codec Errors
//!
//! Every error here is a wire-level problem; the transport answers it with
//! a client error and never retries.

use ids_types::MessageKind;
use thiserror::Error;

/// Errors from decoding or encoding the multipart wire format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The body is too short to declare a boundary.
    #[error("Multipart body too short ({len} bytes)")]
    TooShort { len: usize },

    /// The first line does not declare a boundary.
    #[error("Multipart body does not start with a boundary line")]
    NoBoundary,

    /// A boundary was declared but no named part follows it.
    #[error("Multipart body contains no parts")]
    NoParts,

    /// The `header` part is missing.
    #[error("Multipart body has no header part")]
    MissingHeader,

    /// The header's `@type` is not a known message kind.
    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),

    /// The header could not be deserialized into a message.
    #[error("Invalid message header: {0}")]
    InvalidHeader(String),

    /// The payload does not match the shape the message kind requires.
    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: MessageKind, reason: String },

    /// A message could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Errors from reading a resolved payload as a concrete type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadTypeError {
    /// The message carried no payload.
    #[error("Message carries no payload")]
    NoPayload,

    /// The payload does not deserialize into the requested type.
    #[error("Payload does not match requested type: {0}")]
    Mismatch(String),
}
