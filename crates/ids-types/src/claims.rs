//! # Token Claims
//!
//! Decoded content of a verified DAT. Created per validation call and
//! discarded after verification.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims of a DAT.
///
/// Time fields use the registered JWT names and are (de)serialized as
/// seconds since the epoch. Unregistered claims land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issue time (`iat`). Informational.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Start of validity (`nbf`).
    #[serde(rename = "nbf", with = "chrono::serde::ts_seconds")]
    pub not_before: DateTime<Utc>,

    /// End of validity, exclusive (`exp`).
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    /// Issuing authority (`iss`).
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Subject the token was issued to (`sub`).
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Every other claim, e.g. `securityProfile` or `referringConnector`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Claims {
    /// Claim name of the connector security profile.
    pub const SECURITY_PROFILE: &'static str = "securityProfile";

    /// Claim name of the connector the token was issued for.
    pub const REFERRING_CONNECTOR: &'static str = "referringConnector";

    /// Returns an unregistered claim.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }

    /// Returns an unregistered claim if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(serde_json::Value::as_str)
    }

    /// Returns true if `now` lies within `[not_before, expires_at)`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_before && now < self.expires_at
    }
}
