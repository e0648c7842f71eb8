//! # Header Serializer
//!
//! Compact JSON-LD rendering of [`Message`] headers.
//!
//! ```json
//! {
//!   "@context": {"ids": "https://w3id.org/idsa/core/", "idsc": "https://w3id.org/idsa/code/"},
//!   "@type": "ids:RequestMessage",
//!   "@id": "https://w3id.org/idsa/autogen/request-message/…",
//!   "ids:issuerConnector": {"@id": "https://connector.example.org"},
//!   "ids:issued": {"@value": "2024-01-01T00:00:00Z", "@type": "xsd:dateTimeStamp"},
//!   "ids:securityToken": {"@type": "ids:DynamicAttributeToken", "ids:tokenFormat": {"@id": "idsc:JWT"}, "ids:tokenValue": "…"}
//! }
//! ```
//!
//! Every header attribute round-trips without loss, including sub-second
//! precision of `ids:issued`.

use chrono::{DateTime, SecondsFormat, Utc};
use ids_types::{Message, MessageKind, RejectionReason, Token, TokenFormat};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ParseError;

/// Converts message headers to and from their wire text.
pub trait InfomodelSerializer: Send + Sync {
    /// Renders a header.
    fn serialize(&self, message: &Message) -> Result<String, ParseError>;

    /// Parses a header.
    ///
    /// Fails with `UnsupportedType` when `@type` names no known kind and with
    /// `InvalidHeader` for any other structural problem.
    fn deserialize(&self, text: &str) -> Result<Message, ParseError>;
}

/// JSON-LD header serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLdSerializer;

impl JsonLdSerializer {
    /// Creates a serializer.
    pub fn new() -> Self {
        Self
    }
}

const IDS_NS: &str = "https://w3id.org/idsa/core/";
const IDSC_NS: &str = "https://w3id.org/idsa/code/";
const DATE_TIME_STAMP: &str = "xsd:dateTimeStamp";
const TOKEN_TYPE: &str = "ids:DynamicAttributeToken";

#[derive(Serialize, Deserialize)]
struct Context {
    ids: String,
    idsc: String,
}

#[derive(Serialize, Deserialize)]
struct IdRef {
    #[serde(rename = "@id")]
    id: String,
}

impl IdRef {
    fn of(value: impl Into<String>) -> Self {
        Self { id: value.into() }
    }
}

#[derive(Serialize, Deserialize)]
struct TypedLiteral {
    #[serde(rename = "@value")]
    value: String,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct TokenDto {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(rename = "ids:tokenFormat")]
    format: IdRef,
    #[serde(rename = "ids:tokenValue")]
    value: String,
}

#[derive(Serialize, Deserialize)]
struct MessageDto {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    context: Option<Context>,
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "ids:issuerConnector")]
    issuer_connector: IdRef,
    #[serde(rename = "ids:senderAgent")]
    sender_agent: IdRef,
    #[serde(rename = "ids:modelVersion")]
    model_version: String,
    #[serde(rename = "ids:issued")]
    issued: TypedLiteral,
    #[serde(rename = "ids:securityToken", default, skip_serializing_if = "Option::is_none")]
    security_token: Option<TokenDto>,
    #[serde(rename = "ids:correlationMessage", default, skip_serializing_if = "Option::is_none")]
    correlation_message: Option<IdRef>,
    #[serde(rename = "ids:rejectionReason", default, skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<IdRef>,
    #[serde(rename = "ids:recipientConnector", default, skip_serializing_if = "Vec::is_empty")]
    recipient_connector: Vec<IdRef>,
    #[serde(rename = "ids:requestedArtifact", default, skip_serializing_if = "Option::is_none")]
    requested_artifact: Option<IdRef>,
    #[serde(rename = "ids:requestedElement", default, skip_serializing_if = "Option::is_none")]
    requested_element: Option<IdRef>,
    #[serde(rename = "ids:affectedConnector", default, skip_serializing_if = "Option::is_none")]
    affected_connector: Option<IdRef>,
}

impl InfomodelSerializer for JsonLdSerializer {
    fn serialize(&self, message: &Message) -> Result<String, ParseError> {
        let url_ref = |u: &Url| IdRef::of(u.as_str());
        let dto = MessageDto {
            context: Some(Context {
                ids: IDS_NS.to_string(),
                idsc: IDSC_NS.to_string(),
            }),
            kind: message.kind().type_name().to_string(),
            id: message.id().to_string(),
            issuer_connector: url_ref(message.issuer_connector()),
            sender_agent: url_ref(message.sender_agent()),
            model_version: message.model_version().to_string(),
            issued: TypedLiteral {
                value: message
                    .issued()
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                datatype: Some(DATE_TIME_STAMP.to_string()),
            },
            security_token: message.security_token().map(|t| TokenDto {
                kind: Some(TOKEN_TYPE.to_string()),
                format: IdRef::of(t.format().vocabulary_id()),
                value: t.value().to_string(),
            }),
            correlation_message: message.correlation_message().map(url_ref),
            rejection_reason: message
                .rejection_reason()
                .map(|r| IdRef::of(r.vocabulary_id())),
            recipient_connector: message.recipient_connector().iter().map(url_ref).collect(),
            requested_artifact: message.requested_artifact().map(url_ref),
            requested_element: message.requested_element().map(url_ref),
            affected_connector: message.affected_connector().map(url_ref),
        };
        serde_json::to_string(&dto).map_err(|e| ParseError::Serialize(e.to_string()))
    }

    fn deserialize(&self, text: &str) -> Result<Message, ParseError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ParseError::InvalidHeader(e.to_string()))?;

        let type_name = value
            .get("@type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ParseError::InvalidHeader("missing @type".to_string()))?;
        let kind = MessageKind::parse(type_name)
            .ok_or_else(|| ParseError::UnsupportedType(type_name.to_string()))?;

        let dto: MessageDto =
            serde_json::from_value(value).map_err(|e| ParseError::InvalidHeader(e.to_string()))?;

        let mut builder = Message::builder(kind)
            .id(parse_url("@id", &dto.id)?)
            .issuer_connector(parse_url("ids:issuerConnector", &dto.issuer_connector.id)?)
            .sender_agent(parse_url("ids:senderAgent", &dto.sender_agent.id)?)
            .model_version(dto.model_version)
            .issued(parse_issued(&dto.issued.value)?);

        if let Some(token) = dto.security_token {
            builder = builder.security_token(Token::new(
                TokenFormat::parse(&token.format.id),
                token.value,
            ));
        }
        if let Some(r) = dto.correlation_message {
            builder = builder.correlation_message(parse_url("ids:correlationMessage", &r.id)?);
        }
        if let Some(r) = dto.rejection_reason {
            let reason = RejectionReason::parse(&r.id).ok_or_else(|| {
                ParseError::InvalidHeader(format!("unknown rejection reason {}", r.id))
            })?;
            builder = builder.rejection_reason(reason);
        }
        for r in dto.recipient_connector {
            builder = builder.recipient_connector(parse_url("ids:recipientConnector", &r.id)?);
        }
        if let Some(r) = dto.requested_artifact {
            builder = builder.requested_artifact(parse_url("ids:requestedArtifact", &r.id)?);
        }
        if let Some(r) = dto.requested_element {
            builder = builder.requested_element(parse_url("ids:requestedElement", &r.id)?);
        }
        if let Some(r) = dto.affected_connector {
            builder = builder.affected_connector(parse_url("ids:affectedConnector", &r.id)?);
        }

        builder
            .build()
            .map_err(|e| ParseError::InvalidHeader(e.to_string()))
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ParseError> {
    Url::parse(raw).map_err(|e| ParseError::InvalidHeader(format!("{field}: {e}")))
}

fn parse_issued(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ParseError::InvalidHeader(format!("ids:issued: {e}")))
}
