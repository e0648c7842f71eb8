//! # IDS Types Crate
//!
//! Value types shared across the connector messaging core.
//!
//! ## Design Principles
//!
//! - **Immutable headers**: a [`Message`] is only produced by
//!   [`MessageBuilder::build`] or by the header deserializer; rejections and
//!   correlated responses are always new messages.
//! - **Closed discriminators**: every known message kind is a variant of
//!   [`MessageKind`], so codec and dispatch tables can match exhaustively.
//! - **Token opacity**: the [`Token`] value is never printed by `Debug`.

pub mod claims;
pub mod entities;
pub mod errors;
pub mod message;

pub use claims::Claims;
pub use entities::{MessageKind, RejectionReason, Token, TokenFormat};
pub use errors::MessageBuildError;
pub use message::{Message, MessageBuilder};

/// Infomodel version stamped on messages built without an explicit version.
pub const DEFAULT_MODEL_VERSION: &str = "4.2.7";
