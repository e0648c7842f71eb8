//! # DAT Filter
//!
//! Mandatory first filter: verifies the security token of every inbound
//! message.
//!
//! The peer only ever sees a generic failure message; whether the token
//! was forged, expired or rejected by a rule is kept in the local log.

use std::sync::Arc;

use ids_daps::{fingerprint, TokenVerificationApi, VerificationError};
use ids_types::Message;
use tracing::{debug, warn};

use super::FilterResult;
use crate::domain::config::DeployMode;

/// Message sent to the peer when the token is missing.
pub const MISSING_TOKEN: &str = "Message does not carry a security token";

/// Message sent to the peer when verification fails.
pub const INVALID_TOKEN: &str = "Security token could not be verified";

/// Verifies the DAT unless the connector runs in test mode.
pub struct DatFilter {
    mode: DeployMode,
    verifier: Option<Arc<dyn TokenVerificationApi>>,
}

impl DatFilter {
    /// Creates a verifying filter.
    pub fn new(verifier: Arc<dyn TokenVerificationApi>) -> Self {
        Self {
            mode: DeployMode::Production,
            verifier: Some(verifier),
        }
    }

    /// Creates a filter that skips verification. Never use outside of tests.
    pub fn test_mode() -> Self {
        Self {
            mode: DeployMode::Test,
            verifier: None,
        }
    }

    /// Deployment mode of this filter.
    pub fn mode(&self) -> DeployMode {
        self.mode
    }

    /// Checks the token of `header`.
    pub async fn check(&self, header: &Message) -> FilterResult {
        let verifier = match (&self.mode, &self.verifier) {
            (DeployMode::Production, Some(verifier)) => verifier,
            _ => {
                warn!(
                    message_id = %header.id(),
                    "DAT verification skipped: connector runs in test deploy mode"
                );
                return FilterResult::success("DAT verification skipped in test mode");
            }
        };

        let Some(token) = header.security_token() else {
            warn!(message_id = %header.id(), "Inbound message has no security token");
            return FilterResult::failure(MISSING_TOKEN);
        };

        match verifier.verify(token).await {
            Ok(claims) => {
                debug!(
                    token = %fingerprint(token),
                    subject = ?claims.subject,
                    "DAT accepted"
                );
                FilterResult::success("DAT verified")
            }
            Err(VerificationError::Token(e)) => {
                warn!(token = %fingerprint(token), error = %e, "DAT rejected: token error");
                FilterResult::failure(INVALID_TOKEN).with_error(e.to_string())
            }
            Err(VerificationError::Claims(e)) => {
                warn!(token = %fingerprint(token), error = %e, "DAT rejected: claims error");
                FilterResult::failure(INVALID_TOKEN).with_error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use ids_daps::{ClaimsError, TokenError};
    use ids_types::{Claims, MessageKind, Token};
    use std::collections::BTreeMap;
    use url::Url;

    /// Accepts exactly one token value.
    struct MockVerifier {
        accepted: &'static str,
    }

    #[async_trait]
    impl TokenVerificationApi for MockVerifier {
        async fn verify(&self, token: &Token) -> Result<Claims, VerificationError> {
            if token.value() == "expired" {
                return Err(ClaimsError::Missing.into());
            }
            if token.value() != self.accepted {
                return Err(TokenError::InvalidSignature.into());
            }
            let now = Utc::now();
            Ok(Claims {
                issued_at: now,
                not_before: now,
                expires_at: now + Duration::minutes(1),
                issuer: "https://daps.example.org".into(),
                subject: None,
                extra: BTreeMap::new(),
            })
        }
    }

    fn header(token: Option<&str>) -> Message {
        let mut builder = Message::builder(MessageKind::Request)
            .issuer_connector(Url::parse("https://consumer.example.org").unwrap())
            .sender_agent(Url::parse("https://consumer.example.org/agent").unwrap());
        if let Some(t) = token {
            builder = builder.security_token(Token::jwt(t));
        }
        builder.build().unwrap()
    }

    fn filter() -> DatFilter {
        DatFilter::new(Arc::new(MockVerifier { accepted: "good" }))
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        assert!(filter().check(&header(Some("good"))).await.is_success());
    }

    #[tokio::test]
    async fn test_missing_token_fails() {
        let result = filter().check(&header(None)).await;
        assert!(!result.is_success());
        assert_eq!(result.message(), MISSING_TOKEN);
    }

    #[tokio::test]
    async fn test_token_and_claims_errors_look_alike() {
        let forged = filter().check(&header(Some("forged"))).await;
        let expired = filter().check(&header(Some("expired"))).await;

        assert!(!forged.is_success());
        assert_eq!(forged.message(), expired.message());
        assert_eq!(forged.message(), INVALID_TOKEN);
        assert_ne!(forged.error(), expired.error());
        assert!(forged.error().is_some());
    }

    #[tokio::test]
    async fn test_test_mode_skips_verification() {
        let filter = DatFilter::test_mode();
        assert_eq!(filter.mode(), DeployMode::Test);
        assert!(filter.check(&header(None)).await.is_success());
    }
}
