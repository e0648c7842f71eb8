//! Dispatcher error types.
//!
//! Protocol-level problems never surface here: they become rejection
//! responses. These errors cover implementation bugs and handler failures.

use ids_types::{MessageBuildError, MessageKind};
use thiserror::Error;

/// Failure of a whole `process` call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A filter returned an error or panicked instead of returning a result.
    #[error("filter '{filter}' failed: {reason}")]
    FilterImplementation { filter: String, reason: String },

    /// A rejection response could not be built.
    #[error("failed to build response: {0}")]
    ResponseBuild(#[from] MessageBuildError),
}

/// Failure declared by a message handler.
///
/// Converted to an `INTERNAL_RECIPIENT_ERROR` rejection; the cause is only
/// logged locally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler could not complete its work.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The payload could not be read.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The response header could not be built.
    #[error(transparent)]
    Build(#[from] MessageBuildError),
}

/// Errors from reading a [`crate::MessagePayload`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The message carries no payload.
    #[error("message carries no payload")]
    Absent,

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    /// The payload does not decode into the requested type.
    #[error("payload is not valid JSON for the requested type: {0}")]
    Json(String),
}

/// Errors from building a [`crate::HandlerRegistry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two handlers claim the same message kind.
    #[error("{kind} is claimed by both '{existing}' and '{duplicate}'")]
    DuplicateHandler {
        kind: MessageKind,
        existing: String,
        duplicate: String,
    },

    /// A handler declares no message kind.
    #[error("handler '{0}' supports no message kind")]
    NoSupportedKinds(String),
}
