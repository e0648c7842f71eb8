//! # Error Types
//!
//! Errors raised while constructing shared value types.

use thiserror::Error;

use crate::entities::MessageKind;

/// Errors from [`crate::MessageBuilder::build`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageBuildError {
    /// A required attribute was not set.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A rejection kind was built without a reason code.
    #[error("{0} requires a rejection reason")]
    MissingRejectionReason(MessageKind),

    /// A non-rejection kind was given a reason code.
    #[error("{0} cannot carry a rejection reason")]
    UnexpectedRejectionReason(MessageKind),

    /// The generated id was not a valid IRI.
    #[error("Invalid message id: {0}")]
    InvalidId(String),
}
