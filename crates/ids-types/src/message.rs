//! # Message Header
//!
//! The typed header of every protocol exchange.
//!
//! ## Properties
//!
//! - **Immutability**: fields are private and there are no setters; a
//!   correlated response or rejection is built as a new message.
//! - **Correlation**: responses reference the request through
//!   `correlation_message`.
//! - **Rejection consistency**: a `rejection_reason` is present if and only if
//!   the kind is a rejection kind.

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

use crate::entities::{MessageKind, RejectionReason, Token};
use crate::errors::MessageBuildError;
use crate::DEFAULT_MODEL_VERSION;

/// Base IRI for generated message ids.
const AUTOGEN_BASE: &str = "https://w3id.org/idsa/autogen";

/// An Infomodel message header.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: Url,
    kind: MessageKind,
    issuer_connector: Url,
    sender_agent: Url,
    model_version: String,
    issued: DateTime<Utc>,
    security_token: Option<Token>,
    correlation_message: Option<Url>,
    rejection_reason: Option<RejectionReason>,
    recipient_connector: Vec<Url>,
    requested_artifact: Option<Url>,
    requested_element: Option<Url>,
    affected_connector: Option<Url>,
}

impl Message {
    /// Starts building a message of the given kind.
    pub fn builder(kind: MessageKind) -> MessageBuilder {
        MessageBuilder::new(kind)
    }

    /// Message id.
    pub fn id(&self) -> &Url {
        &self.id
    }

    /// Concrete message kind.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Connector that issued the message.
    pub fn issuer_connector(&self) -> &Url {
        &self.issuer_connector
    }

    /// Agent on whose behalf the message was sent.
    pub fn sender_agent(&self) -> &Url {
        &self.sender_agent
    }

    /// Infomodel version the message was built against.
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Issue timestamp.
    pub fn issued(&self) -> DateTime<Utc> {
        self.issued
    }

    /// DAT carried by the message, if any.
    pub fn security_token(&self) -> Option<&Token> {
        self.security_token.as_ref()
    }

    /// Id of the message this one responds to.
    pub fn correlation_message(&self) -> Option<&Url> {
        self.correlation_message.as_ref()
    }

    /// Reason code of a rejection message.
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        self.rejection_reason
    }

    /// Intended recipient connectors.
    pub fn recipient_connector(&self) -> &[Url] {
        &self.recipient_connector
    }

    /// Artifact requested by an artifact request.
    pub fn requested_artifact(&self) -> Option<&Url> {
        self.requested_artifact.as_ref()
    }

    /// Element requested by a description request.
    pub fn requested_element(&self) -> Option<&Url> {
        self.requested_element.as_ref()
    }

    /// Connector affected by a connector notification.
    pub fn affected_connector(&self) -> Option<&Url> {
        self.affected_connector.as_ref()
    }
}

/// Builder for [`Message`].
///
/// `issuer_connector` and `sender_agent` are required. The id defaults to a
/// generated IRI, `issued` to the current time and `model_version` to
/// [`DEFAULT_MODEL_VERSION`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    kind: MessageKind,
    id: Option<Url>,
    issuer_connector: Option<Url>,
    sender_agent: Option<Url>,
    model_version: Option<String>,
    issued: Option<DateTime<Utc>>,
    security_token: Option<Token>,
    correlation_message: Option<Url>,
    rejection_reason: Option<RejectionReason>,
    recipient_connector: Vec<Url>,
    requested_artifact: Option<Url>,
    requested_element: Option<Url>,
    affected_connector: Option<Url>,
}

impl MessageBuilder {
    /// Creates a builder for the given kind.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            id: None,
            issuer_connector: None,
            sender_agent: None,
            model_version: None,
            issued: None,
            security_token: None,
            correlation_message: None,
            rejection_reason: None,
            recipient_connector: Vec::new(),
            requested_artifact: None,
            requested_element: None,
            affected_connector: None,
        }
    }

    /// Sets an explicit message id.
    pub fn id(mut self, id: Url) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the issuing connector.
    pub fn issuer_connector(mut self, connector: Url) -> Self {
        self.issuer_connector = Some(connector);
        self
    }

    /// Sets the sender agent.
    pub fn sender_agent(mut self, agent: Url) -> Self {
        self.sender_agent = Some(agent);
        self
    }

    /// Sets the Infomodel version.
    pub fn model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = Some(version.into());
        self
    }

    /// Sets the issue timestamp.
    pub fn issued(mut self, issued: DateTime<Utc>) -> Self {
        self.issued = Some(issued);
        self
    }

    /// Attaches a DAT.
    pub fn security_token(mut self, token: Token) -> Self {
        self.security_token = Some(token);
        self
    }

    /// Correlates the message to an earlier message id.
    pub fn correlation_message(mut self, id: Url) -> Self {
        self.correlation_message = Some(id);
        self
    }

    /// Sets the rejection reason. Only valid for rejection kinds.
    pub fn rejection_reason(mut self, reason: RejectionReason) -> Self {
        self.rejection_reason = Some(reason);
        self
    }

    /// Adds a recipient connector.
    pub fn recipient_connector(mut self, connector: Url) -> Self {
        self.recipient_connector.push(connector);
        self
    }

    /// Sets the requested artifact.
    pub fn requested_artifact(mut self, artifact: Url) -> Self {
        self.requested_artifact = Some(artifact);
        self
    }

    /// Sets the requested element.
    pub fn requested_element(mut self, element: Url) -> Self {
        self.requested_element = Some(element);
        self
    }

    /// Sets the affected connector.
    pub fn affected_connector(mut self, connector: Url) -> Self {
        self.affected_connector = Some(connector);
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// - `MissingField` if the issuer connector or sender agent is unset
    /// - `MissingRejectionReason` for a rejection kind without a reason
    /// - `UnexpectedRejectionReason` for a non-rejection kind with a reason
    pub fn build(self) -> Result<Message, MessageBuildError> {
        let issuer_connector = self
            .issuer_connector
            .ok_or(MessageBuildError::MissingField("issuerConnector"))?;
        let sender_agent = self
            .sender_agent
            .ok_or(MessageBuildError::MissingField("senderAgent"))?;

        match (self.kind.is_rejection(), self.rejection_reason) {
            (true, None) => return Err(MessageBuildError::MissingRejectionReason(self.kind)),
            (false, Some(_)) => {
                return Err(MessageBuildError::UnexpectedRejectionReason(self.kind))
            }
            _ => {}
        }

        let id = match self.id {
            Some(id) => id,
            None => generate_id(self.kind)?,
        };

        Ok(Message {
            id,
            kind: self.kind,
            issuer_connector,
            sender_agent,
            model_version: self
                .model_version
                .unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string()),
            issued: self.issued.unwrap_or_else(Utc::now),
            security_token: self.security_token,
            correlation_message: self.correlation_message,
            rejection_reason: self.rejection_reason,
            recipient_connector: self.recipient_connector,
            requested_artifact: self.requested_artifact,
            requested_element: self.requested_element,
            affected_connector: self.affected_connector,
        })
    }
}

fn generate_id(kind: MessageKind) -> Result<Url, MessageBuildError> {
    let raw = format!("{AUTOGEN_BASE}/{}/{}", kind.id_segment(), Uuid::new_v4());
    Url::parse(&raw).map_err(|e| MessageBuildError::InvalidId(e.to_string()))
}
