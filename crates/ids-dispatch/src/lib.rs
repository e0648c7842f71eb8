//! # IDS Message Dispatch
//!
//! Processes inbound protocol messages for a connector.
//!
//! ## Pipeline
//!
//! ```text
//! RECEIVED → FILTERING ──failure──→ REJECTED (MALFORMED_MESSAGE)
//!               │
//!               ▼
//!        HANDLER_RESOLUTION ──none──→ NO_HANDLER_REJECTED (MESSAGE_TYPE_NOT_SUPPORTED)
//!               │
//!               ▼
//!           HANDLING ──error──→ HANDLER_ERROR_REJECTED (INTERNAL_RECIPIENT_ERROR)
//!               │
//!               ▼
//!           RESPONDED
//! ```
//!
//! The DAT filter always runs first; no handler is invoked for a message
//! whose token has not been verified (outside of test deployments).
//!
//! ## Modules
//!
//! - [`domain`]: configuration, errors, responses and the response builder
//! - [`filter`]: DAT filter and the custom filter chain
//! - [`handler`]: handler trait and registry
//! - [`service`]: the [`MessageDispatcher`]
//! - [`adapters`]: multipart HTTP endpoint

pub mod adapters;
pub mod domain;
pub mod filter;
pub mod handler;
pub mod payload;
pub mod service;

pub use adapters::http::{HttpReply, MultipartEndpoint};
pub use domain::builder::ResponseBuilder;
pub use domain::config::{ConfigError, DapsConfig, DeployMode, DispatcherConfig};
pub use domain::error::{DispatchError, HandlerError, PayloadError, RegistryError};
pub use domain::response::{BodyResponse, ErrorResponse, MessageResponse};
pub use filter::dat::DatFilter;
pub use filter::{FilterChain, FilterError, FilterResult, PreDispatchingFilter};
pub use handler::{HandlerRegistry, HandlerRegistryBuilder, MessageHandler};
pub use payload::MessagePayload;
pub use service::MessageDispatcher;
