//! # IDS Multipart Codec
//!
//! Encodes message headers and payloads into the two-part form-data wire
//! format and decodes them back into typed messages.
//!
//! ## Wire Format
//!
//! ```text
//! --<boundary>
//! Content-Disposition: form-data; name="header"
//!
//! <JSON-LD header>
//! --<boundary>
//! Content-Disposition: form-data; name="payload"
//!
//! <payload>
//! --<boundary>--
//! ```
//!
//! ## Payload Discipline
//!
//! An absent `payload` part means "no payload". A present but empty part is
//! an explicit empty payload. Encoding and decoding apply this uniformly.
//!
//! ## Layers
//!
//! - [`codec`]: byte-level part framing
//! - [`serializer`]: header (de)serialization
//! - [`resolver`]: kind → payload shape table and [`MessageAndPayload`]
//!   construction

pub mod codec;
pub mod errors;
pub mod map;
pub mod resolver;
pub mod serializer;

pub use codec::{decode, decode_str, encode_parts, MultipartBody, MultipartCodec};
pub use errors::{ParseError, PayloadTypeError};
pub use map::{MessageAndPayload, MultipartMap, Payload};
pub use resolver::{resolve_and_wrap, verify_resolution_table, PayloadShape};
pub use serializer::{InfomodelSerializer, JsonLdSerializer};

/// Name of the part carrying the serialized header.
pub const HEADER_PART: &str = "header";

/// Name of the part carrying the payload.
pub const PAYLOAD_PART: &str = "payload";
