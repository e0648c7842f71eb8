//! Cross-crate integration tests and their shared fixtures.

pub mod endpoint;
pub mod flows;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use ed25519_dalek::SigningKey;
    use ids_daps::{DapsKey, StaticKeyProvider, TokenSigner};
    use ids_dispatch::DispatcherConfig;
    use ids_types::{Claims, Message, MessageKind, Token};
    use url::Url;

    pub const ISSUER: &str = "https://daps.example.org";
    pub const KEY_ID: &str = "daps-key-1";
    pub const PROVIDER: &str = "https://provider.example.org/";
    pub const CONSUMER: &str = "https://consumer.example.org/";

    pub fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    /// Signer standing in for the DAPS.
    pub fn daps_signer() -> TokenSigner {
        TokenSigner::new(KEY_ID, SigningKey::from_bytes(&[7u8; 32]))
    }

    /// Key provider publishing the DAPS signer's key.
    pub fn daps_keys() -> Arc<StaticKeyProvider> {
        let signer = daps_signer();
        Arc::new(StaticKeyProvider::new(vec![DapsKey::new(
            signer.key_id(),
            signer.verifying_key(),
        )]))
    }

    /// Claims valid for one hour, carrying the base security profile.
    pub fn valid_claims() -> Claims {
        let now = Utc::now();
        let mut extra = BTreeMap::new();
        extra.insert(
            Claims::SECURITY_PROFILE.to_string(),
            serde_json::json!("idsc:BASE_SECURITY_PROFILE"),
        );
        Claims {
            issued_at: now,
            not_before: now - Duration::seconds(5),
            expires_at: now + Duration::hours(1),
            issuer: ISSUER.to_string(),
            subject: Some("consumer".to_string()),
            extra,
        }
    }

    /// Claims that expired ten minutes ago.
    pub fn expired_claims() -> Claims {
        let mut claims = valid_claims();
        claims.issued_at = Utc::now() - Duration::hours(2);
        claims.not_before = claims.issued_at;
        claims.expires_at = Utc::now() - Duration::minutes(10);
        claims
    }

    pub fn token(claims: &Claims) -> Token {
        daps_signer().issue(claims).unwrap()
    }

    /// Production configuration of the provider connector.
    pub fn provider_config() -> DispatcherConfig {
        let mut config = DispatcherConfig::default();
        config.connector_id = PROVIDER.to_string();
        config.sender_agent = format!("{PROVIDER}agent");
        config.daps.issuer = ISSUER.to_string();
        config.daps.required_security_profile = Some("idsc:BASE_SECURITY_PROFILE".into());
        config
    }

    /// Inbound message from the consumer.
    pub fn inbound(kind: MessageKind, token: Option<Token>) -> Message {
        let mut builder = Message::builder(kind)
            .issuer_connector(url(CONSUMER))
            .sender_agent(url(&format!("{CONSUMER}agent")))
            .recipient_connector(url(PROVIDER));
        if let Some(token) = token {
            builder = builder.security_token(token);
        }
        builder.build().unwrap()
    }
}
