//! # Pre-Dispatch Filters
//!
//! Filters inspect a header before any handler sees it. A filter reports a
//! protocol problem through a failed [`FilterResult`]; returning `Err` (or
//! panicking) means the filter itself is broken and fails the whole
//! dispatch.
//!
//! The DAT filter ([`dat::DatFilter`]) always runs before the chain.

pub mod dat;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use ids_types::Message;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::error::DispatchError;

/// Verdict of a filter.
///
/// `message` is what the peer sees. `error` carries local detail for the
/// log and never leaves the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    success: bool,
    message: String,
    error: Option<String>,
}

impl FilterResult {
    /// Passing verdict.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    /// Failing verdict; `message` is sent to the peer.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
        }
    }

    /// Attaches local error detail.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Returns true for a passing verdict.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Verdict message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Local error detail, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Unexpected failure inside a filter implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct FilterError(pub String);

type FilterFn = dyn Fn(&Message) -> Result<FilterResult, FilterError> + Send + Sync;

/// A named filter closure.
#[derive(Clone)]
pub struct PreDispatchingFilter {
    name: String,
    check: Arc<FilterFn>,
}

impl PreDispatchingFilter {
    /// Creates a filter from a closure.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Message) -> Result<FilterResult, FilterError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Filter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the filter. A panic is reported as a [`FilterError`].
    pub fn apply(&self, header: &Message) -> Result<FilterResult, FilterError> {
        match catch_unwind(AssertUnwindSafe(|| (self.check)(header))) {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(FilterError(format!("panicked: {detail}")))
            }
        }
    }
}

impl fmt::Debug for PreDispatchingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreDispatchingFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered list of custom filters, shared by all dispatches.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: RwLock<Vec<PreDispatchingFilter>>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter. Filters run in registration order.
    pub fn register(&self, filter: PreDispatchingFilter) {
        info!(filter = %filter.name(), "Registered pre-dispatch filter");
        self.filters.write().push(filter);
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    /// Returns true if no filter is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every filter against `header` and returns the first failure.
    ///
    /// Evaluates a snapshot taken at the start of the call.
    pub fn run(&self, header: &Message) -> Result<FilterResult, DispatchError> {
        let snapshot: Vec<PreDispatchingFilter> = self.filters.read().clone();

        for filter in &snapshot {
            let result = filter
                .apply(header)
                .map_err(|e| DispatchError::FilterImplementation {
                    filter: filter.name().to_string(),
                    reason: e.0,
                })?;
            if !result.is_success() {
                debug!(filter = %filter.name(), message = %result.message(), "Filter rejected message");
                return Ok(result);
            }
        }

        Ok(FilterResult::success("All filters passed"))
    }

    /// Removes every filter.
    #[cfg(test)]
    pub fn clear(&self) {
        self.filters.write().clear();
    }
}
