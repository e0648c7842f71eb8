//! # Signed Token Validation
//!
//! Pure domain logic for compact signed claims tokens.
//!
//! ## Token Layout
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(signature)
//! ```
//!
//! The header must declare `alg = EdDSA` and a `kid`. The signature is an
//! Ed25519 signature over the ASCII bytes of `header "." claims`.
//!
//! ## Security Notes
//!
//! - Claims are only decoded after the signature has been verified.
//! - Expiry and other claims are NOT checked here; see
//!   [`crate::domain::claims::ClaimsVerifier`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use ids_types::{Claims, Token, TokenFormat};
use sha2::{Digest, Sha256};

use super::entities::{TokenHeader, SUPPORTED_ALGORITHM};
use super::errors::TokenError;
use crate::ports::outbound::PublicKeyResolver;

// =============================================================================
// VALIDATOR
// =============================================================================

/// Authenticates tokens against a set of known public keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenValidator;

impl TokenValidator {
    /// Creates a validator.
    pub fn new() -> Self {
        Self
    }

    /// Decodes the header of a token without verifying anything.
    ///
    /// Used to learn the key id before key material is resolved.
    pub fn peek_header(&self, token: &Token) -> Result<TokenHeader, TokenError> {
        let (header, _, _) = split(token)?;
        decode_header(header)
    }

    /// Verifies the signature of `token` and returns its claims.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if the token is not a JWT
    /// - `Malformed` if a segment cannot be decoded
    /// - `UnsupportedAlgorithm`, `MissingKeyId` for unacceptable headers
    /// - `UnknownKey` if `keys` has no key for the header's key id
    /// - `InvalidSignature` if the signature does not verify
    pub fn validate(
        &self,
        token: &Token,
        keys: &dyn PublicKeyResolver,
    ) -> Result<Claims, TokenError> {
        let (header_b64, claims_b64, signature_b64) = split(token)?;
        let header = decode_header(header_b64)?;

        if header.alg != SUPPORTED_ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }
        let key_id = header.kid.ok_or(TokenError::MissingKeyId)?;
        let key = keys
            .resolve(&key_id)
            .ok_or_else(|| TokenError::UnknownKey(key_id.clone()))?;

        let signature_bytes = decode_segment(signature_b64, "signature")?;
        let signature =
            Signature::from_slice(&signature_bytes).map_err(|_| TokenError::InvalidSignature)?;

        let signing_input = &token.value()[..header_b64.len() + 1 + claims_b64.len()];
        key.verify(signing_input.as_bytes(), &signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims_bytes = decode_segment(claims_b64, "claims")?;
        serde_json::from_slice(&claims_bytes)
            .map_err(|e| TokenError::Malformed(format!("claims: {e}")))
    }
}

// =============================================================================
// SIGNER
// =============================================================================

/// Issues tokens in the format accepted by [`TokenValidator`].
///
/// Stands in for the DAPS in tests and local tooling.
pub struct TokenSigner {
    key_id: String,
    signing_key: SigningKey,
}

impl TokenSigner {
    /// Creates a signer that stamps `key_id` into every header.
    pub fn new(key_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key,
        }
    }

    /// Key id stamped into issued tokens.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Verifying key matching this signer.
    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs `claims` into a JWT-format token.
    pub fn issue(&self, claims: &Claims) -> Result<Token, TokenError> {
        let header = TokenHeader {
            alg: SUPPORTED_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
            kid: Some(self.key_id.clone()),
        };
        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(claims).map_err(|e| TokenError::Malformed(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.signing_key.sign(signing_input.as_bytes());

        Ok(Token::jwt(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )))
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Short, log-safe fingerprint of a token value (first 8 bytes of SHA-256, hex).
pub fn fingerprint(token: &Token) -> String {
    let digest = Sha256::digest(token.value().as_bytes());
    hex::encode(&digest[..8])
}

fn split(token: &Token) -> Result<(&str, &str, &str), TokenError> {
    if *token.format() != TokenFormat::Jwt {
        return Err(TokenError::UnsupportedFormat(token.format().vocabulary_id()));
    }

    let mut segments = token.value().split('.');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
            Ok((h, c, s))
        }
        _ => Err(TokenError::Malformed(
            "expected three non-empty dot-separated segments".to_string(),
        )),
    }
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{what}: {e}")))
}

fn decode_header(segment: &str) -> Result<TokenHeader, TokenError> {
    let bytes = decode_segment(segment, "header")?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(format!("header: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
