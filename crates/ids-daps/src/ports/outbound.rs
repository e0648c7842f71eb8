//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies this crate requires from the host.

use async_trait::async_trait;
use ed25519_dalek::VerifyingKey;
use thiserror::Error;

use crate::domain::entities::DapsKey;

/// Synchronous key lookup used during signature checks.
///
/// Implemented by [`crate::CachingKeyResolver`] and by any
/// `Fn(&str) -> Option<VerifyingKey>` closure.
pub trait PublicKeyResolver: Send + Sync {
    /// Returns the key registered under `key_id`.
    fn resolve(&self, key_id: &str) -> Option<VerifyingKey>;
}

impl<F> PublicKeyResolver for F
where
    F: Fn(&str) -> Option<VerifyingKey> + Send + Sync,
{
    fn resolve(&self, key_id: &str) -> Option<VerifyingKey> {
        self(key_id)
    }
}

/// Error raised by a DAPS key provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyProviderError {
    /// The DAPS could not be reached.
    #[error("DAPS unreachable: {0}")]
    Unavailable(String),

    /// The DAPS answered with key material that could not be decoded.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The cache TTL cannot be added to the current instant.
    #[error("Key cache TTL out of range: {0}")]
    TtlOutOfRange(String),
}

/// Source of DAPS public keys.
#[async_trait]
pub trait DapsPublicKeyProvider: Send + Sync {
    /// Returns every key the DAPS currently publishes.
    async fn provide_public_keys(&self) -> Result<Vec<DapsKey>, KeyProviderError>;

    /// Looks up a single key by id.
    async fn request_public_key(
        &self,
        key_id: &str,
        issuer: &str,
    ) -> Result<Option<DapsKey>, KeyProviderError>;
}
