//! # Response Builder
//!
//! Builds response headers stamped with this connector's identity.
//!
//! Every rejection:
//! - is correlated to the rejected message's id (unless the inbound header
//!   could not be parsed at all)
//! - carries this connector's id, agent and model version
//! - carries the placeholder security token
//! - carries a reason code and a free-text explanation

use ids_types::{Message, MessageBuildError, MessageBuilder, MessageKind, RejectionReason, Token};
use url::Url;

use super::config::{ConfigError, DispatcherConfig};
use super::response::{BodyResponse, ErrorResponse};

/// Factory for outbound headers.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    connector_id: Url,
    sender_agent: Url,
    model_version: String,
}

impl ResponseBuilder {
    /// Creates a builder for the given identity.
    pub fn new(connector_id: Url, sender_agent: Url, model_version: impl Into<String>) -> Self {
        Self {
            connector_id,
            sender_agent,
            model_version: model_version.into(),
        }
    }

    /// Creates a builder from validated configuration.
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.connector_url()?,
            config.sender_agent_url()?,
            config.model_version.clone(),
        ))
    }

    /// This connector's id.
    pub fn connector_id(&self) -> &Url {
        &self.connector_id
    }

    /// Starts a header of `kind` from this connector.
    pub fn header(&self, kind: MessageKind) -> MessageBuilder {
        Message::builder(kind)
            .issuer_connector(self.connector_id.clone())
            .sender_agent(self.sender_agent.clone())
            .model_version(self.model_version.clone())
    }

    /// Starts a header of `kind` answering `request`.
    pub fn correlated(&self, kind: MessageKind, request: &Message) -> MessageBuilder {
        self.header(kind)
            .correlation_message(request.id().clone())
            .recipient_connector(request.issuer_connector().clone())
    }

    /// Builds a rejection of `request`.
    pub fn rejection(
        &self,
        request: &Message,
        reason: RejectionReason,
        explanation: impl Into<String>,
    ) -> Result<ErrorResponse, MessageBuildError> {
        let header = self
            .correlated(MessageKind::Rejection, request)
            .rejection_reason(reason)
            .security_token(Token::placeholder())
            .build()?;
        Ok(ErrorResponse::new(header, explanation.into()))
    }

    /// Builds a rejection for a message whose header could not be read.
    pub fn rejection_uncorrelated(
        &self,
        reason: RejectionReason,
        explanation: impl Into<String>,
    ) -> Result<ErrorResponse, MessageBuildError> {
        let header = self
            .header(MessageKind::Rejection)
            .rejection_reason(reason)
            .security_token(Token::placeholder())
            .build()?;
        Ok(ErrorResponse::new(header, explanation.into()))
    }

    /// Acknowledges `request` without a payload.
    pub fn processed_notification(&self, request: &Message) -> Result<BodyResponse, MessageBuildError> {
        let header = self
            .correlated(MessageKind::MessageProcessedNotification, request)
            .build()?;
        Ok(BodyResponse::new(header, None))
    }
}
