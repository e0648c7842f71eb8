//! # Connector Runtime
//!
//! Serves one multipart message.
//!
//! ```text
//! connector-runtime <content-type> < request.multipart > reply.multipart
//! ```
//!
//! The request body is read from stdin and the reply body written to
//! stdout. Status and reply content type are logged to stderr. Configuration
//! comes from `IDS_*` environment variables, see [`RuntimeConfig`]. The test
//! deploy mode is refused unless `IDS_ALLOW_TEST_MODE` is set.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use connector_runtime::telemetry::init_tracing;
use connector_runtime::{Connector, RuntimeConfig};
use ids_daps::StaticKeyProvider;
use ids_dispatch::DeployMode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log).context("Failed to initialize logging")?;
    config
        .check_deploy_path()
        .context("Refusing to start: set IDS_ALLOW_TEST_MODE=true to run in test mode")?;

    let Some(content_type) = std::env::args().nth(1) else {
        bail!("usage: connector-runtime <content-type> < request");
    };

    let key_provider = load_keys(&config)?;
    let connector = Connector::build(&config.dispatcher, Arc::new(key_provider))
        .await
        .context("Failed to assemble connector")?;

    let mut body = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut body)
        .await
        .context("Failed to read request from stdin")?;

    let reply = connector.endpoint().handle(&content_type, &body).await;
    info!(
        status = reply.status,
        content_type = reply.content_type.as_deref().unwrap_or("-"),
        bytes = reply.body.len(),
        "Request served"
    );

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(&reply.body)
        .await
        .context("Failed to write reply")?;
    stdout.flush().await.context("Failed to flush reply")?;
    Ok(())
}

fn load_keys(config: &RuntimeConfig) -> Result<StaticKeyProvider> {
    match &config.daps_keys {
        Some(path) => {
            let jwks = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read DAPS keys from {}", path.display()))?;
            StaticKeyProvider::from_jwks_json(&jwks).context("Failed to parse DAPS keys")
        }
        None if config.dispatcher.deploy_mode == DeployMode::Test => {
            Ok(StaticKeyProvider::new(Vec::new()))
        }
        None => bail!("IDS_DAPS_KEYS is required in production"),
    }
}
