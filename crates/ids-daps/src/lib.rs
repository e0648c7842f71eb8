//! # DAPS Token Verification
//!
//! Verifies the Dynamic Attribute Token (DAT) carried by inbound messages.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): token decoding, signature checks and claims
//!   rules, no I/O
//! - **Ports Layer** (`ports/`): the verification API and the DAPS key
//!   provider it depends on
//! - **Adapters Layer** (`adapters/`): caching key resolver and a static key
//!   provider
//! - **Service Layer** (`service.rs`): wires domain logic to ports
//!
//! ## Security Notes
//!
//! - Signature authenticity ([`TokenValidator`]) is checked separately from
//!   temporal and business validity ([`ClaimsVerifier`]).
//! - The `kid` in a token header only selects a key from the resolver; a
//!   token can never supply its own key.
//! - Token values are never logged, only their fingerprint.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::key_cache::CachingKeyResolver;
pub use adapters::static_keys::StaticKeyProvider;
pub use domain::claims::{ClaimsVerifier, ValidationRule};
pub use domain::entities::{DapsKey, SecurityProfile, TokenHeader};
pub use domain::errors::{ClaimsError, TokenError, VerificationError};
pub use domain::rules::{issuer_rule, security_profile_rule};
pub use domain::token::{fingerprint, TokenSigner, TokenValidator};
pub use ports::inbound::TokenVerificationApi;
pub use ports::outbound::{DapsPublicKeyProvider, KeyProviderError, PublicKeyResolver};
pub use service::DapsVerificationService;
