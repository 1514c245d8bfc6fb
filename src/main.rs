//! Janus server entry point.
//!
//! Parses CLI arguments and environment variables, loads the YAML
//! configuration, bootstraps the token-signing key, wires the client
//! registry and the static-user authenticator, and starts the HTTP
//! server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use janus::config::JanusConfig;
use janus::errors::StartupError;
use janus::server::authenticator::StaticAuthenticator;
use janus::server::clients::ClientRegistry;
use janus::server::service::start;
use janus::server::signing::load_signer;
use janus::server::state::OidcState;

/// CLI arguments definition for the Janus server.
///
/// Field documentation is used by Clap to generate help text, so keep it
/// in rustdoc format.
#[derive(Parser, Debug, Clone)]
#[command(name = "janus", version, about = "Minimal OpenID Connect identity provider", long_about = None)]
struct Args {
    /// Config file path (overrides default path and JANUS_CONFIG_PATH)
    #[arg(long = "config-file", value_name = "FILE", env = "JANUS_CONFIG_PATH")]
    config_file: Option<std::path::PathBuf>,

    /// Issuer URL, used as the `iss` claim of issued ID Tokens
    #[arg(long = "issuer", value_name = "URL", env = "JANUS_ISSUER")]
    issuer: Option<String>,

    /// URL path prefix the endpoints are mounted under
    #[arg(long = "root-path", value_name = "PATH", env = "JANUS_ROOT_PATH")]
    root_path: Option<String>,

    /// Listener bind address override (optional)
    #[arg(
        long = "bind-address",
        value_name = "BIND_ADDRESS",
        env = "JANUS_BIND_ADDRESS",
        required = false
    )]
    bind_address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).compact();
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    let config = JanusConfig::load_with_overrides(
        args.config_file.clone(),
        args.issuer.clone(),
        args.root_path.clone(),
        args.bind_address.clone(),
    )
    .map_err(|e| StartupError::ConfigError(e.to_string()))?;

    // Key bootstrap is fatal on failure: without a signing key no token
    // this process issues could ever be verified.
    let key_path = config.signing.as_ref().and_then(|s| s.key.as_deref());
    let signer =
        load_signer(key_path).map_err(|e| StartupError::SigningMisconfigured(e.to_string()))?;

    let clients = ClientRegistry::new(config.clients.iter().cloned().map(Into::into).collect());
    let authenticator = Arc::new(StaticAuthenticator::new(
        config.users.iter().cloned().map(Into::into).collect(),
    ));

    tracing::info!(
        "issuer={:?} root={:?} clients={} users={}",
        config.issuer,
        config.root_path,
        config.clients.len(),
        config.users.len()
    );

    let state = Arc::new(OidcState::new(
        config.issuer.clone(),
        &config.root_path,
        clients,
        signer,
        authenticator,
    )?);

    match start(&config, state).await {
        Ok(_) => tracing::debug!("Server has exited"),
        Err(e) => tracing::error!("Server execution failed: {:?}", e),
    }

    Ok(())
}
