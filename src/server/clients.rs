//! Registered relying-party clients and their lookup rules.
//!
//! The registry is populated once at startup and never mutated afterwards,
//! so the hot path reads it without locking. Secret comparison is constant
//! time to avoid leaking secret prefixes through response timing.

use subtle::ConstantTimeEq;

/// Scopes every client may request, independent of its own allowances.
pub const SUPPORTED_SCOPES: &[&str] = &["openid", "email", "profile", "groups"];

/// A relying party registered with this provider.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique client identifier.
    pub id: String,
    /// Shared secret for token-endpoint authentication.
    pub secret: String,
    /// Exact-match set of permitted redirect URIs.
    pub redirect_uris: Vec<String>,
    /// Extra scopes beyond [`SUPPORTED_SCOPES`] this client may request.
    pub scopes: Vec<String>,
    /// When non-empty, an authenticated user must belong to at least one
    /// of these groups.
    pub roles: Vec<String>,
}

/// Immutable lookup table of registered clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<Client>,
}

impl ClientRegistry {
    pub fn new(clients: Vec<Client>) -> Self {
        Self { clients }
    }

    /// Looks up a client by id. Total: an unknown id is `None`, never an
    /// error.
    pub fn find_by_id(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    /// Authenticates a client by id and secret.
    ///
    /// The secret comparison runs in constant time; the client is returned
    /// only when both id and secret match exactly.
    pub fn authenticate(&self, id: &str, secret: &str) -> Option<&Client> {
        let client = self.find_by_id(id)?;
        let matches: bool = client
            .secret
            .as_bytes()
            .ct_eq(secret.as_bytes())
            .into();
        if matches { Some(client) } else { None }
    }

    /// Whether `uri` is one of the client's registered redirect URIs
    /// (exact string match).
    pub fn redirect_uri_allowed(&self, client: &Client, uri: &str) -> bool {
        client.redirect_uris.iter().any(|u| u == uri)
    }

    /// Whether the client may request `scope`: membership in the global
    /// supported set or in the client's own allowance.
    pub fn scope_allowed(&self, client: &Client, scope: &str) -> bool {
        SUPPORTED_SCOPES.contains(&scope) || client.scopes.iter().any(|s| s == scope)
    }
}
