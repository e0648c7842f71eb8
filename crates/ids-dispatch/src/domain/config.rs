//! Dispatcher configuration with validation.

use std::fmt;
use std::str::FromStr;

use ids_daps::SecurityProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Upper bound for `daps.leeway_secs`.
pub const MAX_LEEWAY_SECS: u64 = 3_600;

/// Upper bound for `daps.key_cache_ttl_secs`.
pub const MAX_KEY_CACHE_TTL_SECS: u64 = 7 * 24 * 3_600;

/// Main dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Id of this connector, stamped as `issuerConnector` on responses
    pub connector_id: String,
    /// Agent on whose behalf responses are sent
    pub sender_agent: String,
    /// Infomodel version stamped on responses
    pub model_version: String,
    /// Deployment mode
    pub deploy_mode: DeployMode,
    /// DAPS settings
    pub daps: DapsConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            connector_id: "https://localhost/connector".to_string(),
            sender_agent: "https://localhost/agent".to_string(),
            model_version: ids_types::DEFAULT_MODEL_VERSION.to_string(),
            deploy_mode: DeployMode::Production,
            daps: DapsConfig::default(),
        }
    }
}

impl DispatcherConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connector_url()?;
        self.sender_agent_url()?;

        if self.model_version.trim().is_empty() {
            return Err(ConfigError::Invalid("model_version cannot be empty".into()));
        }

        if self.daps.key_cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "daps.key_cache_ttl_secs cannot be 0".into(),
            ));
        }

        if self.daps.key_cache_ttl_secs > MAX_KEY_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "daps.key_cache_ttl_secs cannot exceed {MAX_KEY_CACHE_TTL_SECS}"
            )));
        }

        if self.daps.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ConfigError::Invalid(format!(
                "daps.leeway_secs cannot exceed {MAX_LEEWAY_SECS}"
            )));
        }

        if self.deploy_mode == DeployMode::Production && self.daps.issuer.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "daps.issuer is required in production".into(),
            ));
        }

        self.daps.security_profile()?;
        Ok(())
    }

    /// Validate configuration for a production deploy path.
    ///
    /// Rejects test mode in addition to everything [`Self::validate`] checks.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.deploy_mode == DeployMode::Test {
            return Err(ConfigError::TestModeInProduction);
        }
        self.validate()
    }

    /// Connector id as an IRI
    pub fn connector_url(&self) -> Result<Url, ConfigError> {
        parse_url("connector_id", &self.connector_id)
    }

    /// Sender agent as an IRI
    pub fn sender_agent_url(&self) -> Result<Url, ConfigError> {
        parse_url("sender_agent", &self.sender_agent)
    }
}

/// DAPS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DapsConfig {
    /// Issuer expected in tokens and passed along with key requests
    pub issuer: String,
    /// Seconds a fetched DAPS key stays cached
    pub key_cache_ttl_secs: u64,
    /// Security profile every peer token must declare
    pub required_security_profile: Option<String>,
    /// Tolerated clock skew when checking token validity
    pub leeway_secs: u64,
}

impl Default for DapsConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            key_cache_ttl_secs: 3600,
            required_security_profile: None,
            leeway_secs: 0,
        }
    }
}

impl DapsConfig {
    /// Parsed required security profile, if one is configured
    pub fn security_profile(&self) -> Result<Option<SecurityProfile>, ConfigError> {
        self.required_security_profile
            .as_deref()
            .map(|raw| {
                SecurityProfile::parse(raw)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown security profile {raw}")))
            })
            .transpose()
    }
}

/// Deployment mode of the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    /// Every token is verified
    Production,
    /// Token verification is skipped. Never use outside of tests.
    Test,
}

impl FromStr for DeployMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::Invalid(format!("unknown deploy mode {other}"))),
        }
    }
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A configured IRI does not parse
    #[error("invalid url in {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
    /// Test mode on a production deploy path
    #[error("test deploy mode is not allowed in production")]
    TestModeInProduction,
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })
}
