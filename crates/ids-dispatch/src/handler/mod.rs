//! # Message Handlers
//!
//! Handlers declare the exact message kinds they answer. The registry maps
//! each kind to exactly one handler and is validated when it is built: two
//! handlers claiming the same kind is a startup error, not a silent
//! override.
//!
//! Resolution is by exact kind only. A handler for
//! [`MessageKind::Rejection`] does not receive
//! [`MessageKind::ContractRejection`] unless it lists both.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ids_types::{Message, MessageKind};
use tracing::info;

use crate::domain::error::{HandlerError, RegistryError};
use crate::domain::response::MessageResponse;
use crate::payload::MessagePayload;

/// Handles messages of the kinds it declares.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Name used in logs and registry errors.
    fn name(&self) -> &str;

    /// Message kinds this handler answers.
    fn supported_kinds(&self) -> Vec<MessageKind>;

    /// Handles one message.
    async fn handle(
        &self,
        header: &Message,
        payload: MessagePayload,
    ) -> Result<MessageResponse, HandlerError>;
}

/// Immutable kind → handler table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<MessageKind, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    /// Starts an empty registration table.
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Handler registered for exactly `kind`.
    pub fn resolve(&self, kind: MessageKind) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Kinds with a handler, in declaration order of [`MessageKind`].
    pub fn supported_kinds(&self) -> Vec<MessageKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.supported_kinds())
            .finish()
    }
}

/// Collects handlers and validates the table on [`build`](Self::build).
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl HandlerRegistryBuilder {
    /// Adds a handler.
    pub fn register(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Builds the table.
    ///
    /// # Errors
    ///
    /// - `NoSupportedKinds` if a handler declares no kind
    /// - `DuplicateHandler` if two handlers claim the same kind
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        let mut handlers: HashMap<MessageKind, Arc<dyn MessageHandler>> = HashMap::new();

        for handler in self.handlers {
            let kinds = handler.supported_kinds();
            if kinds.is_empty() {
                return Err(RegistryError::NoSupportedKinds(handler.name().to_string()));
            }
            for kind in kinds {
                if let Some(existing) = handlers.get(&kind) {
                    if !Arc::ptr_eq(existing, &handler) {
                        return Err(RegistryError::DuplicateHandler {
                            kind,
                            existing: existing.name().to_string(),
                            duplicate: handler.name().to_string(),
                        });
                    }
                    continue;
                }
                info!(handler = %handler.name(), kind = %kind, "Registered message handler");
                handlers.insert(kind, handler.clone());
            }
        }

        Ok(HandlerRegistry { handlers })
    }
}
