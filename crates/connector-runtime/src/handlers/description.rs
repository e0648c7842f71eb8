//! # Self-Description Handler
//!
//! Answers `DescriptionRequestMessage` with the connector's self-description.
//! A request for a specific element other than the connector itself is
//! rejected with `NOT_FOUND`.

use async_trait::async_trait;
use ids_dispatch::{
    BodyResponse, DispatcherConfig, HandlerError, MessageHandler, MessagePayload,
    MessageResponse, ResponseBuilder,
};
use ids_types::{Message, MessageKind, RejectionReason};
use serde_json::{json, Value};
use tracing::debug;

/// Builds the JSON-LD self-description of this connector.
pub fn self_description(config: &DispatcherConfig) -> Value {
    let mut description = json!({
        "@context": {
            "ids": "https://w3id.org/idsa/core/",
            "idsc": "https://w3id.org/idsa/code/"
        },
        "@type": "ids:BaseConnector",
        "@id": config.connector_id,
        "ids:maintainer": { "@id": config.sender_agent },
        "ids:curator": { "@id": config.sender_agent },
        "ids:outboundModelVersion": config.model_version,
        "ids:inboundModelVersion": [config.model_version],
    });
    if let Some(profile) = &config.daps.required_security_profile {
        description["ids:securityProfile"] = json!({ "@id": profile });
    }
    description
}

/// Handler for description requests.
pub struct DescriptionHandler {
    responses: ResponseBuilder,
    description: String,
}

impl DescriptionHandler {
    /// Creates a handler serving `description`.
    pub fn new(responses: ResponseBuilder, description: &Value) -> Self {
        Self {
            responses,
            description: description.to_string(),
        }
    }
}

#[async_trait]
impl MessageHandler for DescriptionHandler {
    fn name(&self) -> &str {
        "self-description"
    }

    fn supported_kinds(&self) -> Vec<MessageKind> {
        vec![MessageKind::DescriptionRequest]
    }

    async fn handle(
        &self,
        header: &Message,
        _payload: MessagePayload,
    ) -> Result<MessageResponse, HandlerError> {
        if let Some(element) = header.requested_element() {
            if element != self.responses.connector_id() {
                debug!(element = %element, "Requested element is not served here");
                let rejection = self.responses.rejection(
                    header,
                    RejectionReason::NotFound,
                    format!("Element {element} not found"),
                )?;
                return Ok(rejection.into());
            }
        }

        let response = self
            .responses
            .correlated(MessageKind::DescriptionResponse, header)
            .build()?;
        Ok(BodyResponse::new(response, Some(self.description.clone())).into())
    }
}
