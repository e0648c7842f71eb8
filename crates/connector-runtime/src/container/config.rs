//! # Runtime Configuration
//!
//! Dispatcher configuration plus runtime-only settings, loaded from
//! `IDS_*` environment variables.
//!
//! | Variable                  | Setting                               |
//! |---------------------------|---------------------------------------|
//! | `IDS_CONNECTOR_ID`        | `dispatcher.connector_id`             |
//! | `IDS_SENDER_AGENT`        | `dispatcher.sender_agent`             |
//! | `IDS_MODEL_VERSION`       | `dispatcher.model_version`            |
//! | `IDS_DEPLOY_MODE`         | `dispatcher.deploy_mode`              |
//! | `IDS_DAPS_ISSUER`         | `dispatcher.daps.issuer`              |
//! | `IDS_KEY_CACHE_TTL_SECS`  | `dispatcher.daps.key_cache_ttl_secs`  |
//! | `IDS_SECURITY_PROFILE`    | `dispatcher.daps.required_security_profile` |
//! | `IDS_CLAIMS_LEEWAY_SECS`  | `dispatcher.daps.leeway_secs`         |
//! | `IDS_DAPS_KEYS`           | path of a JWKS file with DAPS keys    |
//! | `IDS_LOG_LEVEL`           | fallback log filter                   |
//! | `IDS_LOG_JSON`            | `true` for JSON log lines             |
//! | `IDS_ALLOW_TEST_MODE`     | `true` to permit `IDS_DEPLOY_MODE=test` |

use std::path::PathBuf;

use ids_dispatch::{ConfigError, DispatcherConfig};
use thiserror::Error;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Dispatcher configuration.
    pub dispatcher: DispatcherConfig,
    /// JWKS file with DAPS public keys.
    pub daps_keys: Option<PathBuf>,
    /// Logging configuration.
    pub log: LogConfig,
    /// Permits the test deploy mode, which skips DAT verification.
    pub allow_test_mode: bool,
}

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// A variable holds a value that does not parse.
    #[error("{var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    /// The loaded configuration is inconsistent.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

impl RuntimeConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let dispatcher = &mut config.dispatcher;

        if let Some(v) = lookup("IDS_CONNECTOR_ID") {
            dispatcher.connector_id = v;
        }
        if let Some(v) = lookup("IDS_SENDER_AGENT") {
            dispatcher.sender_agent = v;
        }
        if let Some(v) = lookup("IDS_MODEL_VERSION") {
            dispatcher.model_version = v;
        }
        if let Some(v) = lookup("IDS_DEPLOY_MODE") {
            dispatcher.deploy_mode = v.parse().map_err(|e: ConfigError| {
                ConfigLoadError::InvalidVar {
                    var: "IDS_DEPLOY_MODE",
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(v) = lookup("IDS_DAPS_ISSUER") {
            dispatcher.daps.issuer = v;
        }
        if let Some(v) = lookup("IDS_KEY_CACHE_TTL_SECS") {
            dispatcher.daps.key_cache_ttl_secs = parse_number("IDS_KEY_CACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("IDS_SECURITY_PROFILE") {
            dispatcher.daps.required_security_profile = Some(v);
        }
        if let Some(v) = lookup("IDS_CLAIMS_LEEWAY_SECS") {
            dispatcher.daps.leeway_secs = parse_number("IDS_CLAIMS_LEEWAY_SECS", &v)?;
        }

        config.daps_keys = lookup("IDS_DAPS_KEYS").map(PathBuf::from);
        if let Some(v) = lookup("IDS_LOG_LEVEL") {
            config.log.level = v;
        }
        if let Some(v) = lookup("IDS_LOG_JSON") {
            config.log.json = is_enabled(&v);
        }
        if let Some(v) = lookup("IDS_ALLOW_TEST_MODE") {
            config.allow_test_mode = is_enabled(&v);
        }

        config.dispatcher.validate()?;
        Ok(config)
    }

    /// Rejects the test deploy mode unless it was explicitly allowed.
    pub fn check_deploy_path(&self) -> Result<(), ConfigError> {
        if self.allow_test_mode {
            return self.dispatcher.validate();
        }
        self.dispatcher.validate_for_production()
    }
}

fn is_enabled(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_number(var: &'static str, raw: &str) -> Result<u64, ConfigLoadError> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigLoadError::InvalidVar {
            var,
            reason: e.to_string(),
        })
}
