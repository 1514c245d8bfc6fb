//! The pluggable credential-verification seam.
//!
//! The login broker hands every submitted login form to a single
//! [`Authenticator`] registered at startup. The authenticator is opaque to
//! the server: it may consult a directory, an external service, or a static
//! list, and it may be arbitrarily slow. The server never holds session
//! state locks across the call.

use std::collections::HashMap;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

/// What the login broker passes to the authenticator.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// The opaque session value identifying the authorization attempt.
    pub session: String,
    /// Id of the client the end-user is logging in to.
    pub client_id: String,
    /// Scopes admitted for this authorization request.
    pub scopes: Vec<String>,
    /// Every submitted form field, flattened to its first value.
    pub params: HashMap<String, String>,
}

/// Outcome discriminant of an authentication attempt.
///
/// The default is `Invalid`, so a carelessly constructed response degrades
/// to an error page rather than a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Credentials verified; the flow may proceed to token issuance.
    LoginOk,
    /// Credentials rejected; the login form is shown again.
    LoginFailed,
    /// Not a recognized outcome.
    #[default]
    Invalid,
}

/// What the authenticator returns.
///
/// Identity fields are meaningful only when `verdict` is
/// [`Verdict::LoginOk`]; `claims` are merged into the ID Token after the
/// standard claims, preserving insertion order, and can never overwrite a
/// standard claim.
#[derive(Debug, Clone, Default)]
pub struct AuthResponse {
    pub verdict: Verdict,
    /// Login name of the authenticated user, the `sub` of issued tokens.
    pub login: String,
    /// Display name, emitted under the `profile` scope.
    pub name: String,
    /// Email address, emitted under the `email` scope.
    pub mail: String,
    /// Group memberships, emitted under the `groups` scope.
    pub groups: Vec<String>,
    /// Extra ID-token claims, in insertion order.
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl AuthResponse {
    pub fn login_ok(login: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::LoginOk,
            login: login.into(),
            ..Self::default()
        }
    }

    pub fn login_failed() -> Self {
        Self {
            verdict: Verdict::LoginFailed,
            ..Self::default()
        }
    }
}

/// Credential verification, registered once at startup.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: AuthRequest) -> AuthResponse;
}

/// An end-user known to the [`StaticAuthenticator`].
#[derive(Debug, Clone)]
pub struct StaticUser {
    pub login: String,
    pub password: String,
    pub name: String,
    pub mail: String,
    pub groups: Vec<String>,
}

/// Built-in authenticator backed by a fixed user list from configuration.
///
/// Checks the `login` and `password` form fields; password comparison is
/// constant time.
#[derive(Debug, Default)]
pub struct StaticAuthenticator {
    users: Vec<StaticUser>,
}

impl StaticAuthenticator {
    pub fn new(users: Vec<StaticUser>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, request: AuthRequest) -> AuthResponse {
        let login = request.params.get("login").map(String::as_str).unwrap_or("");
        let password = request
            .params
            .get("password")
            .map(String::as_str)
            .unwrap_or("");

        for user in &self.users {
            let matches: bool = user
                .password
                .as_bytes()
                .ct_eq(password.as_bytes())
                .into();
            if user.login == login && matches {
                return AuthResponse {
                    verdict: Verdict::LoginOk,
                    login: user.login.clone(),
                    name: user.name.clone(),
                    mail: user.mail.clone(),
                    groups: user.groups.clone(),
                    claims: serde_json::Map::new(),
                };
            }
        }

        tracing::debug!("static authenticator rejected login {:?}", login);
        AuthResponse::login_failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(login: &str, password: &str) -> AuthRequest {
        let mut params = HashMap::new();
        params.insert("login".to_string(), login.to_string());
        params.insert("password".to_string(), password.to_string());
        AuthRequest {
            session: "sess".to_string(),
            client_id: "test-client".to_string(),
            scopes: vec!["openid".to_string()],
            params,
        }
    }

    fn authenticator() -> StaticAuthenticator {
        StaticAuthenticator::new(vec![StaticUser {
            login: "admin".to_string(),
            password: "secret".to_string(),
            name: "Charlie Root".to_string(),
            mail: "admin@example.com".to_string(),
            groups: vec!["wheel".to_string()],
        }])
    }

    #[tokio::test]
    async fn accepts_matching_credentials() {
        let response = authenticator().authenticate(request("admin", "secret")).await;
        assert_eq!(response.verdict, Verdict::LoginOk);
        assert_eq!(response.login, "admin");
        assert_eq!(response.name, "Charlie Root");
    }

    #[tokio::test]
    async fn rejects_wrong_password_and_unknown_user() {
        let auth = authenticator();
        let response = auth.authenticate(request("admin", "nope")).await;
        assert_eq!(response.verdict, Verdict::LoginFailed);
        let response = auth.authenticate(request("root", "secret")).await;
        assert_eq!(response.verdict, Verdict::LoginFailed);
    }

    #[test]
    fn default_response_is_invalid() {
        assert_eq!(AuthResponse::default().verdict, Verdict::Invalid);
    }
}
