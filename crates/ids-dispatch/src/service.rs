//! # Message Dispatcher
//!
//! Application service driving one inbound message through the pipeline.
//!
//! ## Ordering
//!
//! 1. DAT filter
//! 2. Custom filters, in registration order
//! 3. Handler resolution by exact kind
//! 4. Handler invocation
//!
//! Each stage either hands over to the next or ends the call with a
//! rejection. Nothing is spawned; all work happens inside `process`.

use ids_types::{Message, RejectionReason};
use tracing::{debug, error, warn};

use crate::domain::builder::ResponseBuilder;
use crate::domain::error::DispatchError;
use crate::domain::response::MessageResponse;
use crate::filter::dat::DatFilter;
use crate::filter::{FilterChain, FilterResult, PreDispatchingFilter};
use crate::handler::HandlerRegistry;
use crate::payload::MessagePayload;

/// Explanation sent when no handler answers the message kind.
pub const NO_HANDLER_EXPLANATION: &str = "No handler for provided message type was found!";

/// Explanation sent when a handler fails.
pub const HANDLER_FAILED_EXPLANATION: &str = "Message could not be processed by the recipient.";

/// Dispatches inbound messages to handlers.
pub struct MessageDispatcher {
    dat: DatFilter,
    filters: FilterChain,
    handlers: HandlerRegistry,
    responses: ResponseBuilder,
}

impl MessageDispatcher {
    /// Create a new dispatcher.
    ///
    /// # Arguments
    /// * `dat` - Token filter, always run first
    /// * `handlers` - Validated handler table
    /// * `responses` - Builder stamping this connector's identity
    pub fn new(dat: DatFilter, handlers: HandlerRegistry, responses: ResponseBuilder) -> Self {
        Self {
            dat,
            filters: FilterChain::new(),
            handlers,
            responses,
        }
    }

    /// Appends a custom filter after the DAT filter.
    pub fn register_filter(&self, filter: PreDispatchingFilter) {
        self.filters.register(filter);
    }

    /// Custom filter chain.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Handler table.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Response builder.
    pub fn responses(&self) -> &ResponseBuilder {
        &self.responses
    }

    /// Processes one message.
    ///
    /// Protocol problems come back as `Ok` rejections. `Err` means a filter
    /// implementation failed or a rejection could not be built.
    pub async fn process(
        &self,
        header: Message,
        payload: MessagePayload,
    ) -> Result<MessageResponse, DispatchError> {
        let kind = header.kind();
        debug!(message_id = %header.id(), kind = %kind, "Dispatching message");

        // FILTERING
        let verdict = self.dat.check(&header).await;
        if !verdict.is_success() {
            return self.reject_filtered(&header, &verdict);
        }
        let verdict = self.filters.run(&header)?;
        if !verdict.is_success() {
            return self.reject_filtered(&header, &verdict);
        }

        // HANDLER_RESOLUTION
        let Some(handler) = self.handlers.resolve(kind) else {
            warn!(kind = %kind, "No handler registered for message kind");
            return self.reject(
                &header,
                RejectionReason::MessageTypeNotSupported,
                NO_HANDLER_EXPLANATION,
            );
        };

        // HANDLING
        match handler.handle(&header, payload).await {
            Ok(response) => {
                debug!(handler = %handler.name(), kind = %kind, "Message handled");
                Ok(response)
            }
            Err(e) => {
                error!(
                    handler = %handler.name(),
                    message_id = %header.id(),
                    error = %e,
                    "Handler failed"
                );
                self.reject(
                    &header,
                    RejectionReason::InternalRecipientError,
                    HANDLER_FAILED_EXPLANATION,
                )
            }
        }
    }

    fn reject_filtered(
        &self,
        header: &Message,
        verdict: &FilterResult,
    ) -> Result<MessageResponse, DispatchError> {
        if let Some(detail) = verdict.error() {
            debug!(message_id = %header.id(), detail, "Filter failure detail");
        }
        self.reject(header, RejectionReason::MalformedMessage, verdict.message())
    }

    fn reject(
        &self,
        header: &Message,
        reason: RejectionReason,
        explanation: &str,
    ) -> Result<MessageResponse, DispatchError> {
        warn!(message_id = %header.id(), reason = %reason, explanation, "Rejecting message");
        let rejection = self.responses.rejection(header, reason, explanation)?;
        Ok(MessageResponse::Error(rejection))
    }
}
