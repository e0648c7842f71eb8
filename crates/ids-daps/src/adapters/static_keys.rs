//! Fixed key set provider, loaded from configuration.
//!
//! Accepts a JWKS-style document:
//!
//! ```json
//! {"keys":[{"kty":"OKP","crv":"Ed25519","kid":"daps-1","x":"<base64url>"}]}
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::VerifyingKey;
use serde::Deserialize;

use crate::domain::entities::DapsKey;
use crate::ports::outbound::{DapsPublicKeyProvider, KeyProviderError};

#[derive(Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Deserialize)]
struct Jwk {
    kty: String,
    crv: String,
    kid: String,
    x: String,
}

/// Serves a key set that never changes.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    keys: Vec<DapsKey>,
}

impl StaticKeyProvider {
    /// Creates a provider serving `keys`.
    pub fn new(keys: Vec<DapsKey>) -> Self {
        Self { keys }
    }

    /// Parses a JWKS document containing Ed25519 (`OKP`) keys.
    pub fn from_jwks_json(json: &str) -> Result<Self, KeyProviderError> {
        let set: JwkSet = serde_json::from_str(json)
            .map_err(|e| KeyProviderError::InvalidKeyMaterial(e.to_string()))?;

        let keys = set
            .keys
            .into_iter()
            .map(|jwk| {
                if jwk.kty != "OKP" || jwk.crv != "Ed25519" {
                    return Err(KeyProviderError::InvalidKeyMaterial(format!(
                        "key {}: unsupported key type {}/{}",
                        jwk.kid, jwk.kty, jwk.crv
                    )));
                }
                let raw = URL_SAFE_NO_PAD
                    .decode(&jwk.x)
                    .map_err(|e| KeyProviderError::InvalidKeyMaterial(format!("key {}: {e}", jwk.kid)))?;
                let bytes: [u8; 32] = raw.try_into().map_err(|_| {
                    KeyProviderError::InvalidKeyMaterial(format!("key {}: expected 32 bytes", jwk.kid))
                })?;
                let key = VerifyingKey::from_bytes(&bytes)
                    .map_err(|e| KeyProviderError::InvalidKeyMaterial(format!("key {}: {e}", jwk.kid)))?;
                Ok(DapsKey::new(jwk.kid, key))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { keys })
    }

    /// Keys served by this provider.
    pub fn keys(&self) -> &[DapsKey] {
        &self.keys
    }
}

#[async_trait]
impl DapsPublicKeyProvider for StaticKeyProvider {
    async fn provide_public_keys(&self) -> Result<Vec<DapsKey>, KeyProviderError> {
        Ok(self.keys.clone())
    }

    async fn request_public_key(
        &self,
        key_id: &str,
        _issuer: &str,
    ) -> Result<Option<DapsKey>, KeyProviderError> {
        Ok(self.keys.iter().find(|k| k.key_id == key_id).cloned())
    }
}
