//! Acknowledges inbound notifications.
//!
//! Every notification kind is answered with a `MessageProcessedNotification`
//! except that acknowledgement itself, which gets no response.

use async_trait::async_trait;
use ids_dispatch::{HandlerError, MessageHandler, MessagePayload, MessageResponse, ResponseBuilder};
use ids_types::{Message, MessageKind};
use tracing::info;

/// Handler for notification messages.
pub struct NotificationHandler {
    responses: ResponseBuilder,
}

impl NotificationHandler {
    pub fn new(responses: ResponseBuilder) -> Self {
        Self { responses }
    }
}

#[async_trait]
impl MessageHandler for NotificationHandler {
    fn name(&self) -> &str {
        "notifications"
    }

    fn supported_kinds(&self) -> Vec<MessageKind> {
        vec![
            MessageKind::Notification,
            MessageKind::ConnectorUpdate,
            MessageKind::ConnectorUnavailable,
            MessageKind::ResourceUpdate,
            MessageKind::ResourceUnavailable,
            MessageKind::MessageProcessedNotification,
        ]
    }

    async fn handle(
        &self,
        header: &Message,
        payload: MessagePayload,
    ) -> Result<MessageResponse, HandlerError> {
        info!(
            kind = %header.kind(),
            issuer = %header.issuer_connector(),
            has_payload = payload.is_present(),
            "Notification received"
        );
        if header.kind() == MessageKind::MessageProcessedNotification {
            return Ok(MessageResponse::NoResponse);
        }
        Ok(self.responses.processed_notification(header)?.into())
    }
}
