//! # Core Message Entities
//!
//! Discriminators, rejection reasons and the DAT token carried by a message
//! header.
//!
//! ## Clusters
//!
//! - **Discriminators**: [`MessageKind`]
//! - **Rejections**: [`RejectionReason`]
//! - **Credentials**: [`Token`], [`TokenFormat`]

use std::fmt;

// =============================================================================
// DISCRIMINATORS
// =============================================================================

/// Concrete kind of an Infomodel message.
///
/// The set is closed: an inbound header whose `@type` is not listed here is
/// rejected by the codec before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    /// Generic request.
    Request,
    /// Generic notification.
    Notification,
    /// Generic response.
    Response,
    /// Request for a self-description or one of its elements.
    DescriptionRequest,
    /// Carries a self-description.
    DescriptionResponse,
    /// Request for artifact data.
    ArtifactRequest,
    /// Carries artifact data.
    ArtifactResponse,
    /// Generic rejection.
    Rejection,
    /// Rejection of a contract request. Subtype of [`MessageKind::Rejection`].
    ContractRejection,
    /// Contract negotiation request.
    ContractRequest,
    /// Contract negotiation response.
    ContractResponse,
    /// Final agreed contract.
    ContractAgreement,
    /// Announces an updated connector description.
    ConnectorUpdate,
    /// Announces that a connector is going offline.
    ConnectorUnavailable,
    /// Announces an updated resource description.
    ResourceUpdate,
    /// Announces that a resource is no longer offered.
    ResourceUnavailable,
    /// Query against a broker or index.
    Query,
    /// Result of a query.
    Result,
    /// Acknowledges that a notification was processed.
    MessageProcessedNotification,
}

impl MessageKind {
    /// Every known kind, in declaration order.
    pub const ALL: [MessageKind; 19] = [
        MessageKind::Request,
        MessageKind::Notification,
        MessageKind::Response,
        MessageKind::DescriptionRequest,
        MessageKind::DescriptionResponse,
        MessageKind::ArtifactRequest,
        MessageKind::ArtifactResponse,
        MessageKind::Rejection,
        MessageKind::ContractRejection,
        MessageKind::ContractRequest,
        MessageKind::ContractResponse,
        MessageKind::ContractAgreement,
        MessageKind::ConnectorUpdate,
        MessageKind::ConnectorUnavailable,
        MessageKind::ResourceUpdate,
        MessageKind::ResourceUnavailable,
        MessageKind::Query,
        MessageKind::Result,
        MessageKind::MessageProcessedNotification,
    ];

    /// Returns the compact JSON-LD type name (`ids:...Message`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Request => "ids:RequestMessage",
            Self::Notification => "ids:NotificationMessage",
            Self::Response => "ids:ResponseMessage",
            Self::DescriptionRequest => "ids:DescriptionRequestMessage",
            Self::DescriptionResponse => "ids:DescriptionResponseMessage",
            Self::ArtifactRequest => "ids:ArtifactRequestMessage",
            Self::ArtifactResponse => "ids:ArtifactResponseMessage",
            Self::Rejection => "ids:RejectionMessage",
            Self::ContractRejection => "ids:ContractRejectionMessage",
            Self::ContractRequest => "ids:ContractRequestMessage",
            Self::ContractResponse => "ids:ContractResponseMessage",
            Self::ContractAgreement => "ids:ContractAgreementMessage",
            Self::ConnectorUpdate => "ids:ConnectorUpdateMessage",
            Self::ConnectorUnavailable => "ids:ConnectorUnavailableMessage",
            Self::ResourceUpdate => "ids:ResourceUpdateMessage",
            Self::ResourceUnavailable => "ids:ResourceUnavailableMessage",
            Self::Query => "ids:QueryMessage",
            Self::Result => "ids:ResultMessage",
            Self::MessageProcessedNotification => "ids:MessageProcessedNotificationMessage",
        }
    }

    /// Parses a type name. Accepts the compact `ids:` form and the expanded
    /// `https://w3id.org/idsa/core/` form.
    pub fn parse(value: &str) -> Option<Self> {
        let local = value
            .strip_prefix("ids:")
            .or_else(|| value.strip_prefix("https://w3id.org/idsa/core/"))?;
        Self::ALL
            .iter()
            .copied()
            .find(|kind| &kind.type_name()[4..] == local)
    }

    /// Returns true for rejection kinds (including subtypes).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejection | Self::ContractRejection)
    }

    /// Path segment used when generating message ids.
    pub(crate) fn id_segment(&self) -> String {
        let name = &self.type_name()[4..];
        let mut segment = String::with_capacity(name.len() + 4);
        for (i, ch) in name.chars().enumerate() {
            if ch.is_ascii_uppercase() {
                if i > 0 {
                    segment.push('-');
                }
                segment.push(ch.to_ascii_lowercase());
            } else {
                segment.push(ch);
            }
        }
        segment
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// =============================================================================
// REJECTIONS
// =============================================================================

/// Closed set of reason codes carried by rejection messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// Request parameters were wrong or incomplete.
    BadParameters,
    /// The recipient failed while handling the message.
    InternalRecipientError,
    /// The message could not be validated.
    MalformedMessage,
    /// No handler is registered for the message kind.
    MessageTypeNotSupported,
    /// The requested operation is not supported.
    MethodNotSupported,
    /// The sender could not be authenticated.
    NotAuthenticated,
    /// The sender is not authorized.
    NotAuthorized,
    /// The requested element does not exist.
    NotFound,
    /// The recipient is temporarily unavailable.
    TemporarilyNotAvailable,
    /// The query produced too many results.
    TooManyResults,
    /// The Infomodel version of the message is not supported.
    VersionNotSupported,
}

impl RejectionReason {
    const ALL: [RejectionReason; 11] = [
        RejectionReason::BadParameters,
        RejectionReason::InternalRecipientError,
        RejectionReason::MalformedMessage,
        RejectionReason::MessageTypeNotSupported,
        RejectionReason::MethodNotSupported,
        RejectionReason::NotAuthenticated,
        RejectionReason::NotAuthorized,
        RejectionReason::NotFound,
        RejectionReason::TemporarilyNotAvailable,
        RejectionReason::TooManyResults,
        RejectionReason::VersionNotSupported,
    ];

    /// Returns the code name (`MALFORMED_MESSAGE`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadParameters => "BAD_PARAMETERS",
            Self::InternalRecipientError => "INTERNAL_RECIPIENT_ERROR",
            Self::MalformedMessage => "MALFORMED_MESSAGE",
            Self::MessageTypeNotSupported => "MESSAGE_TYPE_NOT_SUPPORTED",
            Self::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::TemporarilyNotAvailable => "TEMPORARILY_NOT_AVAILABLE",
            Self::TooManyResults => "TOO_MANY_RESULTS",
            Self::VersionNotSupported => "VERSION_NOT_SUPPORTED",
        }
    }

    /// Returns the compact vocabulary id (`idsc:MALFORMED_MESSAGE`).
    pub fn vocabulary_id(&self) -> String {
        format!("idsc:{}", self.code())
    }

    /// Parses a code, with or without the `idsc:` prefix.
    pub fn parse(value: &str) -> Option<Self> {
        let code = value
            .strip_prefix("idsc:")
            .or_else(|| value.strip_prefix("https://w3id.org/idsa/code/"))
            .unwrap_or(value);
        Self::ALL.iter().copied().find(|r| r.code() == code)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Encoding of a token value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenFormat {
    /// Compact signed claims token.
    Jwt,
    /// Any other format, kept by vocabulary id.
    Other(String),
}

impl TokenFormat {
    /// Returns the compact vocabulary id (`idsc:JWT`).
    pub fn vocabulary_id(&self) -> String {
        match self {
            Self::Jwt => "idsc:JWT".to_string(),
            Self::Other(id) => id.clone(),
        }
    }

    /// Parses a vocabulary id. Unknown ids are preserved as [`TokenFormat::Other`].
    pub fn parse(value: &str) -> Self {
        match value {
            "idsc:JWT" | "https://w3id.org/idsa/code/JWT" => Self::Jwt,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Dynamic Attribute Token carried in a message header.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    format: TokenFormat,
    value: String,
}

impl Token {
    /// Value of the placeholder token attached to rejections.
    pub const PLACEHOLDER_VALUE: &'static str = "rejected!";

    /// Creates a token.
    pub fn new(format: TokenFormat, value: impl Into<String>) -> Self {
        Self {
            format,
            value: value.into(),
        }
    }

    /// Creates a JWT-format token.
    pub fn jwt(value: impl Into<String>) -> Self {
        Self::new(TokenFormat::Jwt, value)
    }

    /// Non-verifiable token carried by rejection messages.
    pub fn placeholder() -> Self {
        Self::jwt(Self::PLACEHOLDER_VALUE)
    }

    /// Token format.
    pub fn format(&self) -> &TokenFormat {
        &self.format
    }

    /// Raw token value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("format", &self.format)
            .field("value", &format_args!("<{} bytes>", self.value.len()))
            .finish()
    }
}
