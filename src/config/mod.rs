use serde::{Deserialize, Serialize};
/**
 * Janus configuration root module.
 *
 * - Defines the root configuration struct (`JanusConfig`) and its defaults.
 * - Provides config file loading, CLI/env override logic, and error reporting.
 * - Uses `components.rs` for client/user/signing types and `defaults.rs`
 *   for default helpers.
 */
use std::{path::Path, path::PathBuf};
use thiserror::Error;

pub use components::{ClientConfig, SigningConfig, UserConfig};

pub mod components;
pub mod defaults;

// Root configuration for the Janus server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanusConfig {
    /// Issuer URL, used as the `iss` claim and as the base of the
    /// endpoint URLs published by discovery.
    #[serde(default = "defaults::default_issuer")]
    pub issuer: String,

    /// URL path prefix all endpoints are mounted under. Empty or "/"
    /// mounts at the server root.
    #[serde(default = "defaults::default_root_path")]
    pub root_path: String,

    /// Listener bind address.
    #[serde(default = "defaults::default_bind_address")]
    pub bind_address: Option<String>,

    /// Directory served as static files for requests that match no
    /// endpoint. Disabled when absent.
    #[serde(default)]
    pub web_root: Option<String>,

    /// Token-signing key material. An ephemeral RSA keypair is generated
    /// when not configured.
    #[serde(default)]
    pub signing: Option<SigningConfig>,

    /// Registered relying-party clients.
    #[serde(default)]
    pub clients: Vec<ClientConfig>,

    /// Static end-users for the built-in authenticator.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for JanusConfig {
    fn default() -> Self {
        Self {
            issuer: defaults::default_issuer(),
            root_path: defaults::default_root_path(),
            bind_address: defaults::default_bind_address(),
            web_root: None,
            signing: None,
            clients: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl JanusConfig {
    /// Compute the default configuration file path.
    pub fn default_path() -> PathBuf {
        // Allow override via environment variable
        if let Some(override_path) = std::env::var_os("JANUS_CONFIG_PATH") {
            return PathBuf::from(override_path);
        }
        if cfg!(target_os = "windows") {
            let home = std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .unwrap_or_default();
            let mut p = PathBuf::from(home);
            p.push("janus");
            p.push("config");
            p
        } else {
            PathBuf::from("/").join("etc").join("janus").join("config")
        }
    }

    /// Load config from file and apply CLI overrides.
    ///
    /// Loads configuration from a YAML file if it exists, otherwise uses
    /// defaults. Then applies command-line overrides with highest
    /// precedence.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to the configuration file. Uses default if None.
    /// * `issuer` - Issuer URL override.
    /// * `root_path` - Mount-path override.
    /// * `bind_address` - Listener bind address override.
    ///
    /// # Returns
    /// The loaded and overridden configuration, or a ConfigError.
    pub fn load_with_overrides(
        config_path: Option<PathBuf>,
        issuer: Option<String>,
        root_path: Option<String>,
        bind_address: Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or_else(Self::default_path);

        let mut cfg = if path.exists() {
            tracing::debug!("Reading from configuration file {:?}", path);
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Parse(path.clone(), format!("I/O error: {}", e)))?;
            Self::parse_yaml_with_path(&path, &text)?
        } else {
            tracing::warn!(
                "No configuration file (checked {:?}) initializing with defaults",
                path
            );
            Self::default()
        };

        // Apply CLI/env overrides (highest precedence)
        if let Some(issuer) = issuer {
            cfg.issuer = issuer;
        }
        if let Some(root) = root_path {
            cfg.root_path = root;
        }
        if let Some(addr) = bind_address {
            cfg.bind_address = Some(addr);
        }

        if cfg.clients.is_empty() {
            tracing::warn!("no clients configured; every authorization request will be rejected");
        }

        Ok(cfg)
    }

    /// Parse YAML configuration with enhanced error reporting.
    ///
    /// Uses serde_yaml_ng to parse the YAML text, and includes line/column
    /// information in error messages for better debugging.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (for error messages).
    /// * `text` - The YAML content as a string.
    ///
    /// # Returns
    /// The parsed configuration, or a ConfigError with detailed location info.
    fn parse_yaml_with_path(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str::<Self>(text).map_err(|e| {
            let msg = if let Some(loc) = e.location() {
                format!(
                    "yaml error at line {}, column {}: {}",
                    loc.line(),
                    loc.column(),
                    e
                )
            } else {
                format!("yaml error: {}", e)
            };

            ConfigError::Parse(path.to_path_buf(), msg)
        })
    }
}

// Errors during configuration loading/parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration content.
    ///
    /// Tuple fields:
    /// - 0: Path to the configuration file that failed to parse
    /// - 1: Error message from the underlying parser
    #[error("Failed to parse {0}: {1}")]
    Parse(PathBuf, String),
}
