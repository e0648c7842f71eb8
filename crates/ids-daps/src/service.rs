//! # DAPS Verification Service
//!
//! Application service layer that implements the `TokenVerificationApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`TokenVerificationApi`)
//! - Pulls missing keys through the caching resolver and its outbound
//!   `DapsPublicKeyProvider`
//! - Delegates signature and claims checks to the domain layer

use std::sync::Arc;

use async_trait::async_trait;
use ids_types::{Claims, Token};
use tracing::debug;

use crate::adapters::key_cache::CachingKeyResolver;
use crate::domain::claims::ClaimsVerifier;
use crate::domain::errors::{TokenError, VerificationError};
use crate::domain::token::{fingerprint, TokenValidator};
use crate::ports::inbound::TokenVerificationApi;

/// DAT verification service.
pub struct DapsVerificationService {
    keys: Arc<CachingKeyResolver>,
    claims: Arc<ClaimsVerifier>,
    validator: TokenValidator,
    issuer: String,
}

impl DapsVerificationService {
    /// Create a new verification service.
    ///
    /// # Arguments
    /// * `keys` - Key cache in front of the DAPS
    /// * `claims` - Claims verifier holding the validation rules
    /// * `issuer` - DAPS issuer passed along with key requests
    pub fn new(
        keys: Arc<CachingKeyResolver>,
        claims: Arc<ClaimsVerifier>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            keys,
            claims,
            validator: TokenValidator::new(),
            issuer: issuer.into(),
        }
    }

    /// Claims verifier used by this service, for registering rules.
    pub fn claims_verifier(&self) -> &Arc<ClaimsVerifier> {
        &self.claims
    }
}

#[async_trait]
impl TokenVerificationApi for DapsVerificationService {
    async fn verify(&self, token: &Token) -> Result<Claims, VerificationError> {
        let header = self.validator.peek_header(token)?;
        let key_id = header.kid.ok_or(TokenError::MissingKeyId)?;

        self.keys
            .ensure(&key_id, &self.issuer)
            .await
            .map_err(|e| TokenError::KeyProvider(e.to_string()))?;

        let claims = self.validator.validate(token, self.keys.as_ref())?;
        self.claims.verify(Some(&claims))?;

        debug!(token = %fingerprint(token), key_id = %key_id, "DAT verified");
        Ok(claims)
    }
}
