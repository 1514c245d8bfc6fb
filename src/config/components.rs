/// Janus configuration components module.
///
/// This module defines the user-facing configuration structures for the
/// server: registered relying-party clients, static end-users for the
/// built-in authenticator, and token-signing key material. They serve as
/// building blocks for the root `JanusConfig` in `mod.rs`.
use serde::{Deserialize, Serialize};

use crate::server::authenticator::StaticUser;
use crate::server::clients::Client;

/// A relying-party client registered with the provider.
///
/// Clients are loaded once at startup and are immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client identifier, the `aud` of issued ID Tokens.
    pub id: String,

    /// Shared secret presented at the token endpoint.
    pub secret: String,

    /// Exact-match redirect URIs this client may use.
    pub redirect_uris: Vec<String>,

    /// Extra scopes this client may request beyond the globally
    /// supported set.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// When non-empty, an authenticated user must belong to at least one
    /// of these groups to complete a login for this client.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<ClientConfig> for Client {
    fn from(c: ClientConfig) -> Self {
        Client {
            id: c.id,
            secret: c.secret,
            redirect_uris: c.redirect_uris,
            scopes: c.scopes,
            roles: c.roles,
        }
    }
}

/// An end-user known to the built-in static authenticator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Login name, the `sub` of issued ID Tokens.
    pub login: String,

    /// Plain-text password checked by the static authenticator.
    pub password: String,

    /// Display name, emitted under the `profile` scope.
    #[serde(default)]
    pub name: String,

    /// Email address, emitted under the `email` scope.
    #[serde(default)]
    pub mail: String,

    /// Group memberships, emitted under the `groups` scope and checked
    /// against per-client role restrictions.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl From<UserConfig> for StaticUser {
    fn from(u: UserConfig) -> Self {
        StaticUser {
            login: u.login,
            password: u.password,
            name: u.name,
            mail: u.mail,
            groups: u.groups,
        }
    }
}

/// Token-signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SigningConfig {
    /// Path to a PEM-encoded RSA private key. When absent, an ephemeral
    /// keypair is generated at startup.
    pub key: Option<String>,
}
