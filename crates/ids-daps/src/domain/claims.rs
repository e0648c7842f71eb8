//! # Claims Verification
//!
//! Checks the temporal validity of authentic claims and runs the registered
//! validation rules against them.
//!
//! ## Order of Checks
//!
//! 1. Claims present
//! 2. `not_before <= now < expires_at` (widened by the configured leeway)
//! 3. Rules in registration order; the first failing rule stops evaluation
//!
//! Rules are registered at startup but may also be added while requests are
//! in flight. Each verification evaluates a snapshot of the rule list taken
//! at its start.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ids_types::Claims;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::errors::ClaimsError;

type RuleFn = dyn Fn(&Claims) -> Result<(), String> + Send + Sync;

/// A named predicate over claims.
///
/// The check returns `Err(reason)` to reject the claims.
#[derive(Clone)]
pub struct ValidationRule {
    name: String,
    check: Arc<RuleFn>,
}

impl ValidationRule {
    /// Creates a rule from a closure.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Claims) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Rule name, reported in failures.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the rule. A panic inside the check counts as a failure.
    pub fn evaluate(&self, claims: &Claims) -> Result<(), ClaimsError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.check)(claims)));
        let reason = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(reason)) => reason,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("rule panicked: {detail}")
            }
        };
        Err(ClaimsError::RuleFailed {
            rule: self.name.clone(),
            reason,
        })
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// VERIFIER
// =============================================================================

/// Verifies claims against time and the registered rules.
#[derive(Debug, Default)]
pub struct ClaimsVerifier {
    rules: RwLock<Vec<ValidationRule>>,
    leeway: Duration,
}

impl ClaimsVerifier {
    /// Creates a verifier with no rules and zero leeway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a verifier that tolerates `leeway` of clock skew on both
    /// ends of the validity window.
    pub fn with_leeway(leeway: Duration) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            leeway,
        }
    }

    /// Appends a rule. Rules run in registration order.
    pub fn register_rule(&self, rule: ValidationRule) {
        info!(rule = %rule.name(), "Registered claims validation rule");
        self.rules.write().push(rule);
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Verifies claims against the current time.
    pub fn verify(&self, claims: Option<&Claims>) -> Result<(), ClaimsError> {
        self.verify_at(claims, Utc::now())
    }

    /// Verifies claims against an explicit point in time.
    pub fn verify_at(&self, claims: Option<&Claims>, now: DateTime<Utc>) -> Result<(), ClaimsError> {
        let claims = claims.ok_or(ClaimsError::Missing)?;

        let out_of_range = || ClaimsError::LeewayOutOfRange {
            leeway_secs: self.leeway.num_seconds(),
        };
        let latest = now.checked_add_signed(self.leeway).ok_or_else(out_of_range)?;
        let earliest = now.checked_sub_signed(self.leeway).ok_or_else(out_of_range)?;

        if latest < claims.not_before || earliest >= claims.expires_at {
            warn!(
                %now,
                not_before = %claims.not_before,
                expires_at = %claims.expires_at,
                "Claims outside validity window"
            );
            return Err(ClaimsError::NotValidAt {
                now,
                not_before: claims.not_before,
                expires_at: claims.expires_at,
            });
        }

        let snapshot: Vec<ValidationRule> = self.rules.read().clone();
        for rule in &snapshot {
            if let Err(e) = rule.evaluate(claims) {
                warn!(rule = %rule.name(), error = %e, "Claims rejected by rule");
                return Err(e);
            }
        }

        debug!(rules = snapshot.len(), "Claims verified");
        Ok(())
    }

    /// Removes every registered rule.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.rules.write().clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
