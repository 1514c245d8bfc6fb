//! Shared server state for the OIDC endpoints.
//!
//! Everything except the session store is read-only after startup, so the
//! state is shared as a plain `Arc` through an axum `Extension`.

use std::sync::Arc;

use anyhow::Result;
use axum::response::Html;

use crate::server::authenticator::Authenticator;
use crate::server::clients::ClientRegistry;
use crate::server::sessions::SessionStore;
use crate::server::signing::DynSigner;
use crate::server::templates::Templates;

/// Central state object shared across all OIDC endpoint handlers.
pub struct OidcState {
    /// Issuer URL, the `iss` of every issued token and the base of the
    /// endpoint URLs published by discovery.
    pub issuer: String,
    /// Normalized mount prefix ("" when mounted at the server root).
    pub root: String,
    /// Registered relying parties.
    pub clients: ClientRegistry,
    /// Live authorization sessions.
    pub sessions: SessionStore,
    /// The token-signing key and its public JWKS.
    pub signer: DynSigner,
    /// Credential verification, opaque and potentially slow.
    pub authenticator: Arc<dyn Authenticator>,
    pub templates: Templates,
}

impl std::fmt::Debug for OidcState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcState")
            .field("issuer", &self.issuer)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl OidcState {
    pub fn new(
        issuer: impl Into<String>,
        root: &str,
        clients: ClientRegistry,
        signer: DynSigner,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        Ok(Self {
            issuer: issuer.into(),
            root: normalize_root(root),
            clients,
            sessions: SessionStore::new(),
            signer,
            authenticator,
            templates: Templates::new()?,
        })
    }

    /// Root-relative URL the login form posts back to.
    pub fn login_post_url(&self) -> String {
        format!("{}/auth/login", self.root)
    }

    /// Renders the user-facing error page. Always HTTP 200 with a
    /// human-readable body.
    pub fn error_page(&self, error_type: &str, error: &str) -> Html<String> {
        Html(self.templates.render_error(error_type, error))
    }
}

/// Normalizes a mount prefix: no trailing slash, a leading slash when
/// non-empty. "" and "/" both mean the server root.
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
