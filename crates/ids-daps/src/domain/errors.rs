//! # Verification Errors
//!
//! Error types for token and claims verification.
//!
//! Token errors concern authenticity (structure, key, signature); claims
//! errors concern validity of an authentic token. Both end up as the same
//! remote rejection, but local logs keep them apart.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from decoding or authenticating a token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not in a supported format.
    #[error("Unsupported token format: {0}")]
    UnsupportedFormat(String),

    /// The token structure could not be decoded.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The header declares an algorithm other than EdDSA.
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The header carries no key id.
    #[error("Token header has no key id")]
    MissingKeyId,

    /// No public key is known for the key id.
    #[error("No public key known for key id {0}")]
    UnknownKey(String),

    /// The signature does not match the signing input.
    #[error("Token signature verification failed")]
    InvalidSignature,

    /// Key material could not be fetched from the DAPS.
    #[error("DAPS key provider failed: {0}")]
    KeyProvider(String),
}

/// Errors from checking the claims of an authentic token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClaimsError {
    /// No claims were available.
    #[error("Token claims are missing")]
    Missing,

    /// The validity window does not contain the verification time.
    #[error("Token not valid at {now}: valid from {not_before} until {expires_at}")]
    NotValidAt {
        now: DateTime<Utc>,
        not_before: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },

    /// The leeway pushes the validity check outside the representable time range.
    #[error("Clock leeway of {leeway_secs}s is out of range")]
    LeewayOutOfRange { leeway_secs: i64 },

    /// A registered validation rule rejected the claims.
    #[error("Validation rule '{rule}' failed: {reason}")]
    RuleFailed { rule: String, reason: String },
}

/// Result of the combined verification performed by the service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// The token could not be authenticated.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The token is authentic but its claims were rejected.
    #[error(transparent)]
    Claims(#[from] ClaimsError),
}
