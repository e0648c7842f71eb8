//! # Domain Entities
//!
//! Key material and token header structures.

use std::fmt;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

/// Signature algorithm accepted in token headers.
pub const SUPPORTED_ALGORITHM: &str = "EdDSA";

/// Header segment of a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm.
    pub alg: String,
    /// Token type, usually `JWT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Id of the key that signed the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// A DAPS public key, addressed by key id.
#[derive(Clone, PartialEq, Eq)]
pub struct DapsKey {
    /// Key id as it appears in token headers.
    pub key_id: String,
    /// Ed25519 verifying key.
    pub key: VerifyingKey,
}

impl DapsKey {
    /// Creates a key entry.
    pub fn new(key_id: impl Into<String>, key: VerifyingKey) -> Self {
        Self {
            key_id: key_id.into(),
            key,
        }
    }
}

impl fmt::Debug for DapsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DapsKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// Connector security profile, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityProfile {
    /// `idsc:BASE_SECURITY_PROFILE`
    Base,
    /// `idsc:TRUST_SECURITY_PROFILE`
    Trust,
    /// `idsc:TRUST_PLUS_SECURITY_PROFILE`
    TrustPlus,
}

impl SecurityProfile {
    /// Parses a profile id, with or without the `idsc:` prefix.
    pub fn parse(value: &str) -> Option<Self> {
        match value.strip_prefix("idsc:").unwrap_or(value) {
            "BASE_SECURITY_PROFILE" | "BASE_CONNECTOR_SECURITY_PROFILE" => Some(Self::Base),
            "TRUST_SECURITY_PROFILE" | "TRUSTED_CONNECTOR_SECURITY_PROFILE" => Some(Self::Trust),
            "TRUST_PLUS_SECURITY_PROFILE" | "TRUSTED_CONNECTOR_PLUS_SECURITY_PROFILE" => {
                Some(Self::TrustPlus)
            }
            _ => None,
        }
    }

    /// Returns the compact vocabulary id.
    pub fn vocabulary_id(&self) -> &'static str {
        match self {
            Self::Base => "idsc:BASE_SECURITY_PROFILE",
            Self::Trust => "idsc:TRUST_SECURITY_PROFILE",
            Self::TrustPlus => "idsc:TRUST_PLUS_SECURITY_PROFILE",
        }
    }

    /// Returns true if this profile is at least as strong as `required`.
    pub fn satisfies(&self, required: SecurityProfile) -> bool {
        *self >= required
    }
}
