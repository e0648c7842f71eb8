//! # Endpoint Flows
//!
//! Multipart requests through the fully assembled connector, as a web
//! framework would hand them over: a `Content-Type` header and raw bytes.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use connector_runtime::Connector;
    use ids_dispatch::adapters::http::{STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_OK};
    use ids_dispatch::{DeployMode, FilterResult, HttpReply, PreDispatchingFilter};
    use ids_multipart::{
        decode, InfomodelSerializer, JsonLdSerializer, MultipartCodec, HEADER_PART, PAYLOAD_PART,
    };
    use ids_types::{Message, MessageKind, RejectionReason};

    use crate::integration::fixtures::*;

    async fn connector() -> Connector {
        Connector::build(&provider_config(), daps_keys()).await.unwrap()
    }

    fn codec() -> MultipartCodec {
        MultipartCodec::new(Arc::new(JsonLdSerializer::new()))
    }

    async fn post(connector: &Connector, message: &Message, payload: Option<&str>) -> HttpReply {
        let body = codec().encode(message, payload).unwrap();
        connector
            .endpoint()
            .handle(&body.content_type(), body.body())
            .await
    }

    fn reply_parts(reply: &HttpReply) -> (Message, Option<String>) {
        let mut parts = decode(&reply.body).unwrap();
        let header = JsonLdSerializer::new()
            .deserialize(&parts[HEADER_PART])
            .unwrap();
        (header, parts.remove(PAYLOAD_PART))
    }

    #[tokio::test]
    async fn test_description_request_round_trip() {
        let connector = connector().await;
        let request = inbound(MessageKind::DescriptionRequest, Some(token(&valid_claims())));

        let reply = post(&connector, &request, None).await;

        assert_eq!(reply.status, STATUS_OK);
        assert!(reply
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        let (header, payload) = reply_parts(&reply);
        assert_eq!(header.kind(), MessageKind::DescriptionResponse);
        assert_eq!(header.correlation_message(), Some(request.id()));
        assert_eq!(header.issuer_connector(), &url(PROVIDER));

        let description: serde_json::Value = serde_json::from_str(&payload.unwrap()).unwrap();
        assert_eq!(description["@id"], PROVIDER);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_over_http() {
        let connector = connector().await;
        let request = inbound(MessageKind::DescriptionRequest, Some(token(&expired_claims())));

        let reply = post(&connector, &request, None).await;

        assert_eq!(reply.status, STATUS_OK);
        let (header, payload) = reply_parts(&reply);
        assert_eq!(header.kind(), MessageKind::Rejection);
        assert_eq!(header.rejection_reason(), Some(RejectionReason::MalformedMessage));
        assert_eq!(
            payload.as_deref(),
            Some(ids_dispatch::filter::dat::INVALID_TOKEN)
        );
    }

    #[tokio::test]
    async fn test_unsupported_kind_over_http() {
        let connector = connector().await;
        let request = inbound(MessageKind::ContractRequest, Some(token(&valid_claims())));

        let reply = post(&connector, &request, Some(r#"{"@type":"ids:ContractRequest"}"#)).await;

        let (header, _) = reply_parts(&reply);
        assert_eq!(
            header.rejection_reason(),
            Some(RejectionReason::MessageTypeNotSupported)
        );
    }

    #[tokio::test]
    async fn test_notification_acknowledged() {
        let connector = connector().await;
        let request = inbound(MessageKind::ConnectorUpdate, Some(token(&valid_claims())));

        let reply = post(&connector, &request, Some(r#"{"@type":"ids:BaseConnector"}"#)).await;

        let (header, payload) = reply_parts(&reply);
        assert_eq!(header.kind(), MessageKind::MessageProcessedNotification);
        assert_eq!(payload, None);
    }

    #[tokio::test]
    async fn test_acknowledgement_gets_empty_reply() {
        let connector = connector().await;
        let request = inbound(
            MessageKind::MessageProcessedNotification,
            Some(token(&valid_claims())),
        );

        let reply = post(&connector, &request, None).await;

        assert_eq!(reply.status, STATUS_OK);
        assert!(reply.body.is_empty());
        assert_eq!(reply.content_type, None);
    }

    #[tokio::test]
    async fn test_structured_payload_must_be_json() {
        let connector = connector().await;
        let request = inbound(MessageKind::ResourceUpdate, Some(token(&valid_claims())));

        let reply = post(&connector, &request, Some("not json")).await;

        assert_eq!(reply.status, STATUS_BAD_REQUEST);
        let (header, _) = reply_parts(&reply);
        assert_eq!(header.rejection_reason(), Some(RejectionReason::MalformedMessage));
        assert_eq!(header.correlation_message(), None);
    }

    #[tokio::test]
    async fn test_missing_header_part_is_bad_request() {
        let connector = connector().await;
        let body = ids_multipart::encode_parts([(PAYLOAD_PART, "orphan payload")]);

        let reply = connector
            .endpoint()
            .handle(&body.content_type(), body.body())
            .await;

        assert_eq!(reply.status, STATUS_BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_multipart_is_server_error() {
        let connector = connector().await;
        let reply = connector
            .endpoint()
            .handle("application/ld+json", b"{}")
            .await;
        assert_eq!(reply.status, STATUS_INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_custom_filter_on_assembled_connector() {
        let connector = connector().await;
        connector
            .dispatcher()
            .register_filter(PreDispatchingFilter::new("consumer-blocklist", |header| {
                if header.issuer_connector().as_str() == CONSUMER {
                    Ok(FilterResult::failure("Connector is blocked"))
                } else {
                    Ok(FilterResult::success("Connector allowed"))
                }
            }));
        let request = inbound(MessageKind::DescriptionRequest, Some(token(&valid_claims())));

        let reply = post(&connector, &request, None).await;

        let (header, payload) = reply_parts(&reply);
        assert_eq!(header.rejection_reason(), Some(RejectionReason::MalformedMessage));
        assert_eq!(payload.as_deref(), Some("Connector is blocked"));
    }

    #[tokio::test]
    async fn test_test_mode_accepts_tokenless_messages() {
        let mut config = provider_config();
        config.deploy_mode = DeployMode::Test;
        let connector = Connector::build(&config, daps_keys()).await.unwrap();

        let reply = post(&connector, &inbound(MessageKind::DescriptionRequest, None), None).await;

        let (header, _) = reply_parts(&reply);
        assert_eq!(header.kind(), MessageKind::DescriptionResponse);
    }
}
