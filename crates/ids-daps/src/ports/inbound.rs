//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this crate.

use async_trait::async_trait;
use ids_types::{Claims, Token};

use crate::domain::errors::VerificationError;

/// Primary DAT verification API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait TokenVerificationApi: Send + Sync {
    /// Authenticates `token` and checks its claims.
    ///
    /// # Errors
    ///
    /// - `VerificationError::Token` if the token cannot be authenticated
    /// - `VerificationError::Claims` if the token is authentic but expired,
    ///   not yet valid, or rejected by a rule
    async fn verify(&self, token: &Token) -> Result<Claims, VerificationError>;
}
