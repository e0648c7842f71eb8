//! # Connector Bootstrap
//!
//! Composition root. Builds the verification stack, the explicit handler
//! table and the dispatcher, in that order, and fails fast on any
//! inconsistency found along the way.
//!
//! ## Handler Table
//!
//! | Handler            | Kinds                                             |
//! |--------------------|---------------------------------------------------|
//! | `self-description` | DescriptionRequest                                |
//! | `notifications`    | Notification, ConnectorUpdate, ConnectorUnavailable, ResourceUpdate, ResourceUnavailable, MessageProcessedNotification |
//!
//! Every other kind is answered with `MESSAGE_TYPE_NOT_SUPPORTED`.

use std::sync::Arc;
use std::time::Duration;

use ids_daps::{
    issuer_rule, security_profile_rule, CachingKeyResolver, ClaimsVerifier,
    DapsPublicKeyProvider, DapsVerificationService,
};
use ids_dispatch::{
    ConfigError, DatFilter, DeployMode, DispatcherConfig, HandlerRegistry, MessageDispatcher,
    MultipartEndpoint, RegistryError, ResponseBuilder,
};
use ids_multipart::{verify_resolution_table, JsonLdSerializer, MultipartCodec};
use thiserror::Error;
use tracing::{info, warn};

use crate::handlers::{self_description, DescriptionHandler, NotificationHandler};

/// Errors while assembling the connector.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("handler table error: {0}")]
    Registry(#[from] RegistryError),

    #[error("payload resolution table incomplete: {0}")]
    ResolutionTable(String),
}

/// Builds the handler table of this connector.
pub fn handler_registry(
    config: &DispatcherConfig,
    responses: &ResponseBuilder,
) -> Result<HandlerRegistry, RegistryError> {
    HandlerRegistry::builder()
        .register(Arc::new(DescriptionHandler::new(
            responses.clone(),
            &self_description(config),
        )))
        .register(Arc::new(NotificationHandler::new(responses.clone())))
        .build()
}

/// Builds the claims verifier with the configured rules.
pub fn claims_verifier(config: &DispatcherConfig) -> Result<ClaimsVerifier, ConfigError> {
    let leeway = i64::try_from(config.daps.leeway_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid("daps.leeway_secs out of range".into()))?;
    let verifier = ClaimsVerifier::with_leeway(leeway);

    if !config.daps.issuer.is_empty() {
        verifier.register_rule(issuer_rule(config.daps.issuer.clone()));
    }
    if let Some(profile) = config.daps.security_profile()? {
        verifier.register_rule(security_profile_rule(profile));
    }
    Ok(verifier)
}

/// Fully wired connector.
pub struct Connector {
    dispatcher: Arc<MessageDispatcher>,
    endpoint: MultipartEndpoint,
    keys: Arc<CachingKeyResolver>,
    claims: Arc<ClaimsVerifier>,
}

impl Connector {
    /// Assembles the connector.
    ///
    /// An unreachable key provider at startup is logged and tolerated; keys
    /// are requested again on first use.
    pub async fn build(
        config: &DispatcherConfig,
        key_provider: Arc<dyn DapsPublicKeyProvider>,
    ) -> Result<Self, BootstrapError> {
        verify_resolution_table().map_err(BootstrapError::ResolutionTable)?;
        config.validate()?;

        let responses = ResponseBuilder::from_config(config)?;
        let claims = Arc::new(claims_verifier(config)?);
        let keys = Arc::new(CachingKeyResolver::with_ttl(
            key_provider,
            Duration::from_secs(config.daps.key_cache_ttl_secs),
        ));

        let dat = match config.deploy_mode {
            DeployMode::Production => {
                if let Err(e) = keys.refresh().await {
                    warn!(error = %e, "Could not preload DAPS keys");
                }
                DatFilter::new(Arc::new(DapsVerificationService::new(
                    keys.clone(),
                    claims.clone(),
                    config.daps.issuer.clone(),
                )))
            }
            DeployMode::Test => {
                warn!("Connector runs in test deploy mode: DAT verification disabled");
                DatFilter::test_mode()
            }
        };

        let handlers = handler_registry(config, &responses)?;
        info!(
            connector = %responses.connector_id(),
            kinds = handlers.len(),
            rules = claims.rule_count(),
            mode = %config.deploy_mode,
            "Connector assembled"
        );

        let dispatcher = Arc::new(MessageDispatcher::new(dat, handlers, responses));
        let codec = MultipartCodec::new(Arc::new(JsonLdSerializer::new()));
        let endpoint = MultipartEndpoint::new(dispatcher.clone(), codec);

        Ok(Self {
            dispatcher,
            endpoint,
            keys,
            claims,
        })
    }

    /// Dispatcher, for registering custom filters.
    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    /// Multipart endpoint.
    pub fn endpoint(&self) -> &MultipartEndpoint {
        &self.endpoint
    }

    /// DAPS key cache.
    pub fn keys(&self) -> &Arc<CachingKeyResolver> {
        &self.keys
    }

    /// Claims verifier, for registering additional rules.
    pub fn claims_verifier(&self) -> &Arc<ClaimsVerifier> {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ids_daps::{DapsKey, KeyProviderError, StaticKeyProvider};
    use ids_types::MessageKind;

    struct Offline;

    #[async_trait]
    impl DapsPublicKeyProvider for Offline {
        async fn provide_public_keys(&self) -> Result<Vec<DapsKey>, KeyProviderError> {
            Err(KeyProviderError::Unavailable("connection refused".into()))
        }

        async fn request_public_key(
            &self,
            _key_id: &str,
            _issuer: &str,
        ) -> Result<Option<DapsKey>, KeyProviderError> {
            Err(KeyProviderError::Unavailable("connection refused".into()))
        }
    }

    fn production() -> DispatcherConfig {
        let mut config = DispatcherConfig::default();
        config.connector_id = "https://provider.example.org".into();
        config.sender_agent = "https://provider.example.org/agent".into();
        config.daps.issuer = "https://daps.example.org".into();
        config
    }

    #[test]
    fn test_handler_table_has_no_overlap() {
        let config = production();
        let responses = ResponseBuilder::from_config(&config).unwrap();
        let registry = handler_registry(&config, &responses).unwrap();

        assert_eq!(registry.len(), 7);
        assert!(registry.resolve(MessageKind::DescriptionRequest).is_some());
        assert!(registry.resolve(MessageKind::ArtifactRequest).is_none());
    }

    #[test]
    fn test_claims_rules_follow_config() {
        let mut config = production();
        assert_eq!(claims_verifier(&config).unwrap().rule_count(), 1);

        config.daps.required_security_profile = Some("idsc:BASE_SECURITY_PROFILE".into());
        assert_eq!(claims_verifier(&config).unwrap().rule_count(), 2);

        config.daps.required_security_profile = Some("idsc:GOLD".into());
        assert!(claims_verifier(&config).is_err());
    }

    #[test]
    fn test_unrepresentable_leeway_is_config_error() {
        let mut config = production();
        config.daps.leeway_secs = u64::MAX;
        assert!(matches!(claims_verifier(&config), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_huge_cache_ttl_rejected_before_startup() {
        let mut config = production();
        config.daps.key_cache_ttl_secs = u64::MAX;

        let result = Connector::build(&config, Arc::new(StaticKeyProvider::new(vec![]))).await;
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn test_offline_daps_does_not_block_startup() {
        let connector = Connector::build(&production(), Arc::new(Offline))
            .await
            .unwrap();
        assert!(connector.keys().is_empty());
        assert_eq!(connector.dispatcher().handlers().len(), 7);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_fast() {
        let mut config = production();
        config.daps.issuer.clear();

        let result = Connector::build(&config, Arc::new(StaticKeyProvider::new(vec![]))).await;
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn test_test_mode_uses_skipping_filter() {
        let mut config = production();
        config.deploy_mode = DeployMode::Test;

        let connector = Connector::build(&config, Arc::new(StaticKeyProvider::new(vec![])))
            .await
            .unwrap();
        assert!(connector.keys().is_empty());
    }
}
