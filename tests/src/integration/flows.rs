//! # Dispatcher Flows
//!
//! Drives messages through a [`MessageDispatcher`] whose DAT filter verifies
//! real Ed25519-signed tokens against a key cache.
//!
//! ## Flows Tested
//!
//! 1. Valid token, registered kind: handler response passes through
//! 2. Expired token: `MALFORMED_MESSAGE`, handler never runs
//! 3. Valid token, unregistered kind: `MESSAGE_TYPE_NOT_SUPPORTED`
//! 4. Handler failure: `INTERNAL_RECIPIENT_ERROR` with a fixed explanation
//! 5. Handler rejection (`BAD_PARAMETERS`): returned unchanged

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use connector_runtime::bootstrap::claims_verifier;
    use ed25519_dalek::SigningKey;
    use ids_daps::{CachingKeyResolver, DapsVerificationService, TokenSigner, ValidationRule};
    use ids_dispatch::filter::dat::INVALID_TOKEN;
    use ids_dispatch::service::{HANDLER_FAILED_EXPLANATION, NO_HANDLER_EXPLANATION};
    use ids_dispatch::{
        BodyResponse, DatFilter, HandlerError, HandlerRegistry, MessageDispatcher,
        MessageHandler, MessagePayload, MessageResponse, PreDispatchingFilter, FilterResult,
        ResponseBuilder,
    };
    use ids_types::{Message, MessageKind, RejectionReason, Token};

    use crate::integration::fixtures::*;

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Answers requests with the uppercased payload.
    struct ShoutHandler {
        calls: AtomicUsize,
        responses: ResponseBuilder,
    }

    #[async_trait]
    impl MessageHandler for ShoutHandler {
        fn name(&self) -> &str {
            "shout"
        }

        fn supported_kinds(&self) -> Vec<MessageKind> {
            vec![MessageKind::Request]
        }

        async fn handle(
            &self,
            header: &Message,
            payload: MessagePayload,
        ) -> Result<MessageResponse, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = payload.as_text()?.to_uppercase();
            let response = self
                .responses
                .correlated(MessageKind::Response, header)
                .build()?;
            Ok(BodyResponse::new(response, Some(text)).into())
        }
    }

    struct BrokenQueryHandler;

    #[async_trait]
    impl MessageHandler for BrokenQueryHandler {
        fn name(&self) -> &str {
            "broken-query"
        }

        fn supported_kinds(&self) -> Vec<MessageKind> {
            vec![MessageKind::Query]
        }

        async fn handle(
            &self,
            _header: &Message,
            _payload: MessagePayload,
        ) -> Result<MessageResponse, HandlerError> {
            Err(HandlerError::Failed("connection to postgres://db:5432 lost".into()))
        }
    }

    /// Rejects every description request as having bad parameters and
    /// keeps the rejection it produced.
    struct StrictParameterHandler {
        responses: ResponseBuilder,
        produced: Mutex<Option<MessageResponse>>,
    }

    #[async_trait]
    impl MessageHandler for StrictParameterHandler {
        fn name(&self) -> &str {
            "strict-parameters"
        }

        fn supported_kinds(&self) -> Vec<MessageKind> {
            vec![MessageKind::DescriptionRequest]
        }

        async fn handle(
            &self,
            header: &Message,
            _payload: MessagePayload,
        ) -> Result<MessageResponse, HandlerError> {
            let response: MessageResponse = self
                .responses
                .rejection(header, RejectionReason::BadParameters, "request")?
                .into();
            *self.produced.lock().unwrap() = Some(response.clone());
            Ok(response)
        }
    }

    // =========================================================================
    // Fixture
    // =========================================================================

    struct Harness {
        dispatcher: MessageDispatcher,
        shout: Arc<ShoutHandler>,
        strict: Arc<StrictParameterHandler>,
        verifier: Arc<ids_daps::ClaimsVerifier>,
    }

    fn harness() -> Harness {
        let config = provider_config();
        let responses = ResponseBuilder::from_config(&config).unwrap();
        let verifier = Arc::new(claims_verifier(&config).unwrap());
        let keys = Arc::new(CachingKeyResolver::new(daps_keys()));
        let dat = DatFilter::new(Arc::new(DapsVerificationService::new(
            keys,
            verifier.clone(),
            ISSUER,
        )));

        let shout = Arc::new(ShoutHandler {
            calls: AtomicUsize::new(0),
            responses: responses.clone(),
        });
        let strict = Arc::new(StrictParameterHandler {
            responses: responses.clone(),
            produced: Mutex::new(None),
        });
        let handlers = HandlerRegistry::builder()
            .register(shout.clone())
            .register(strict.clone())
            .register(Arc::new(BrokenQueryHandler))
            .build()
            .unwrap();

        Harness {
            dispatcher: MessageDispatcher::new(dat, handlers, responses),
            shout,
            strict,
            verifier,
        }
    }

    fn expect_rejection(response: MessageResponse) -> ids_dispatch::ErrorResponse {
        match response {
            MessageResponse::Error(rejection) => rejection,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    // =========================================================================
    // Flows
    // =========================================================================

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let h = harness();
        let request = inbound(MessageKind::Request, Some(token(&valid_claims())));

        let response = h
            .dispatcher
            .process(request.clone(), MessagePayload::from_bytes("hello"))
            .await
            .unwrap();

        let MessageResponse::Body(body) = response else {
            panic!("expected body response");
        };
        assert_eq!(body.payload(), Some("HELLO"));
        assert_eq!(body.header().kind(), MessageKind::Response);
        assert_eq!(body.header().correlation_message(), Some(request.id()));
        assert_eq!(body.header().recipient_connector(), &[url(CONSUMER)]);
        assert_eq!(h.shout.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_rejection_returned_unchanged() {
        let h = harness();
        let request = inbound(MessageKind::DescriptionRequest, Some(token(&valid_claims())));

        let response = h
            .dispatcher
            .process(request.clone(), MessagePayload::empty())
            .await
            .unwrap();

        let produced = h.strict.produced.lock().unwrap().clone().unwrap();
        assert_eq!(response, produced);

        let rejection = expect_rejection(response);
        assert_eq!(rejection.rejection_reason(), Some(RejectionReason::BadParameters));
        assert_eq!(rejection.explanation(), "request");
        assert_eq!(rejection.header().id(), produced.header().unwrap().id());
        assert_eq!(rejection.header().correlation_message(), Some(request.id()));
    }

    #[tokio::test]
    async fn test_expired_token_is_malformed_message() {
        let h = harness();
        let request = inbound(MessageKind::Request, Some(token(&expired_claims())));

        let response = h
            .dispatcher
            .process(request.clone(), MessagePayload::from_bytes("hello"))
            .await
            .unwrap();

        let rejection = expect_rejection(response);
        assert_eq!(rejection.rejection_reason(), Some(RejectionReason::MalformedMessage));
        assert_eq!(rejection.explanation(), INVALID_TOKEN);
        assert_eq!(rejection.header().correlation_message(), Some(request.id()));
        assert_eq!(rejection.header().security_token(), Some(&Token::placeholder()));
        assert_eq!(h.shout.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forged_token_looks_like_expired_token() {
        let h = harness();
        let forger = TokenSigner::new(KEY_ID, SigningKey::from_bytes(&[9u8; 32]));
        let forged = forger.issue(&valid_claims()).unwrap();

        let forged = h
            .dispatcher
            .process(inbound(MessageKind::Request, Some(forged)), MessagePayload::empty())
            .await
            .unwrap();
        let expired = h
            .dispatcher
            .process(
                inbound(MessageKind::Request, Some(token(&expired_claims()))),
                MessagePayload::empty(),
            )
            .await
            .unwrap();

        assert_eq!(
            expect_rejection(forged).explanation(),
            expect_rejection(expired).explanation()
        );
    }

    #[tokio::test]
    async fn test_unregistered_kind_not_supported() {
        let h = harness();
        let request = inbound(MessageKind::ArtifactRequest, Some(token(&valid_claims())));

        let rejection = expect_rejection(
            h.dispatcher
                .process(request, MessagePayload::empty())
                .await
                .unwrap(),
        );

        assert_eq!(
            rejection.rejection_reason(),
            Some(RejectionReason::MessageTypeNotSupported)
        );
        assert_eq!(rejection.explanation(), NO_HANDLER_EXPLANATION);
    }

    #[tokio::test]
    async fn test_handler_failure_is_internal_recipient_error() {
        let h = harness();
        let request = inbound(MessageKind::Query, Some(token(&valid_claims())));

        let rejection = expect_rejection(
            h.dispatcher
                .process(request, MessagePayload::from_bytes("SELECT 1"))
                .await
                .unwrap(),
        );

        assert_eq!(
            rejection.rejection_reason(),
            Some(RejectionReason::InternalRecipientError)
        );
        assert_eq!(rejection.explanation(), HANDLER_FAILED_EXPLANATION);
        assert!(!rejection.explanation().contains("postgres"));
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let h = harness();

        let rejection = expect_rejection(
            h.dispatcher
                .process(inbound(MessageKind::Request, None), MessagePayload::empty())
                .await
                .unwrap(),
        );

        assert_eq!(rejection.rejection_reason(), Some(RejectionReason::MalformedMessage));
        assert_eq!(h.shout.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_security_profile_rejected() {
        let h = harness();
        let mut claims = valid_claims();
        claims.extra.insert(
            ids_types::Claims::SECURITY_PROFILE.to_string(),
            serde_json::json!("idsc:TRUST_SECURITY_PROFILE"),
        );

        let response = h
            .dispatcher
            .process(
                inbound(MessageKind::Request, Some(token(&claims))),
                MessagePayload::from_bytes("hello"),
            )
            .await
            .unwrap();

        assert_eq!(response.rejection_reason(), Some(RejectionReason::MalformedMessage));
    }

    #[tokio::test]
    async fn test_rule_registered_at_runtime_applies() {
        let h = harness();
        h.verifier.register_rule(ValidationRule::new("subject-allowlist", |claims| {
            match claims.subject.as_deref() {
                Some("partner") => Ok(()),
                other => Err(format!("subject {other:?} not allowed")),
            }
        }));

        let response = h
            .dispatcher
            .process(
                inbound(MessageKind::Request, Some(token(&valid_claims()))),
                MessagePayload::from_bytes("hello"),
            )
            .await
            .unwrap();

        assert_eq!(response.rejection_reason(), Some(RejectionReason::MalformedMessage));
        assert_eq!(h.shout.calls.load(Ordering::SeqCst), 0);

        h.verifier.reset();
        let response = h
            .dispatcher
            .process(
                inbound(MessageKind::Request, Some(token(&valid_claims()))),
                MessagePayload::from_bytes("hello"),
            )
            .await
            .unwrap();
        assert!(!response.is_rejection());
    }

    #[tokio::test]
    async fn test_custom_filter_runs_after_dat() {
        let h = harness();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        h.dispatcher
            .register_filter(PreDispatchingFilter::new("counter", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(FilterResult::success("counted"))
            }));

        // Rejected by the DAT filter: custom filter never sees it.
        h.dispatcher
            .process(
                inbound(MessageKind::Request, Some(token(&expired_claims()))),
                MessagePayload::empty(),
            )
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        h.dispatcher
            .process(
                inbound(MessageKind::Request, Some(token(&valid_claims()))),
                MessagePayload::from_bytes("hi"),
            )
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
