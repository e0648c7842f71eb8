//! # Caching Key Resolver
//!
//! Holds DAPS public keys fetched through a [`DapsPublicKeyProvider`] so that
//! repeated dispatches do not re-fetch them.
//!
//! ## Design
//!
//! - Uses a `HashMap<String, (VerifyingKey, Instant)>` of key id to key and
//!   expiry instant
//! - Expired entries are invisible to [`PublicKeyResolver::resolve`] and are
//!   re-fetched by [`CachingKeyResolver::ensure`]
//! - Fetching is async; resolving is a synchronous map read

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ed25519_dalek::VerifyingKey;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::domain::entities::DapsKey;
use crate::ports::outbound::{DapsPublicKeyProvider, KeyProviderError, PublicKeyResolver};

/// Default time a fetched key stays usable.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);

/// TTL cache in front of a DAPS key provider.
pub struct CachingKeyResolver {
    provider: Arc<dyn DapsPublicKeyProvider>,
    ttl: Duration,
    /// Map of key id -> (key, expiry instant)
    entries: RwLock<HashMap<String, (VerifyingKey, Instant)>>,
}

impl CachingKeyResolver {
    /// Creates an empty cache with the default TTL.
    pub fn new(provider: Arc<dyn DapsPublicKeyProvider>) -> Self {
        Self::with_ttl(provider, DEFAULT_KEY_TTL)
    }

    /// Creates an empty cache with a custom TTL.
    pub fn with_ttl(provider: Arc<dyn DapsPublicKeyProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches every published key and replaces the cache content.
    ///
    /// Returns the number of keys now cached.
    pub async fn refresh(&self) -> Result<usize, KeyProviderError> {
        let keys = self.provider.provide_public_keys().await?;
        let expiry = self.expiry()?;

        let mut entries = self.entries.write();
        entries.clear();
        for key in keys {
            entries.insert(key.key_id, (key.key, expiry));
        }
        info!(keys = entries.len(), "Refreshed DAPS key cache");
        Ok(entries.len())
    }

    /// Makes sure a fresh key for `key_id` is cached, fetching it if needed.
    ///
    /// Returns `false` if the provider does not know the key.
    pub async fn ensure(&self, key_id: &str, issuer: &str) -> Result<bool, KeyProviderError> {
        if self.resolve(key_id).is_some() {
            return Ok(true);
        }

        debug!(key_id, issuer, "DAPS key not cached, requesting");
        match self.provider.request_public_key(key_id, issuer).await? {
            Some(key) if key.key_id == key_id => {
                self.insert(key)?;
                Ok(true)
            }
            Some(key) => {
                warn!(
                    requested = key_id,
                    returned = %key.key_id,
                    "DAPS returned a key for a different key id"
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Caches a key directly.
    pub fn insert(&self, key: DapsKey) -> Result<(), KeyProviderError> {
        let expiry = self.expiry()?;
        self.entries.write().insert(key.key_id, (key.key, expiry));
        Ok(())
    }

    fn expiry(&self) -> Result<Instant, KeyProviderError> {
        Instant::now()
            .checked_add(self.ttl)
            .ok_or_else(|| KeyProviderError::TtlOutOfRange(format!("{}s", self.ttl.as_secs())))
    }

    /// Returns the number of cached entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PublicKeyResolver for CachingKeyResolver {
    fn resolve(&self, key_id: &str) -> Option<VerifyingKey> {
        let entries = self.entries.read();
        match entries.get(key_id) {
            Some((key, expiry)) if *expiry > Instant::now() => Some(*key),
            _ => None,
        }
    }
}
