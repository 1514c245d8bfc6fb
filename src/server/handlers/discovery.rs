//! Discovery and JWKS endpoints.
//!
//! `GET {root}/.well-known/openid-configuration` publishes the provider
//! metadata; `GET {root}/keys` publishes the public JWKS relying parties
//! use to verify issued ID Tokens.

use std::sync::Arc;

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::server::clients::SUPPORTED_SCOPES;
use crate::server::signing::Signer as _;
use crate::server::state::OidcState;

/// OpenID Connect Discovery document, per OpenID Connect Discovery 1.0.
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    /// Issuer identifier the provider asserts in every ID Token.
    pub issuer: String,

    /// URL of the authorization endpoint.
    pub authorization_endpoint: String,

    /// URL of the token endpoint.
    pub token_endpoint: String,

    /// URL of the JSON Web Key Set document.
    pub jwks_uri: String,

    /// OAuth 2.0 response_type values this provider supports.
    pub response_types_supported: Vec<String>,

    /// OAuth 2.0 grant types this provider supports.
    pub grant_types_supported: Vec<String>,

    /// Subject identifier types this provider supports.
    pub subject_types_supported: Vec<String>,

    /// JWS signing algorithms supported for the ID Token.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Scopes this provider supports.
    pub scopes_supported: Vec<String>,

    /// Client authentication methods supported by the token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// Claim names this provider may emit.
    pub claims_supported: Vec<String>,
}

impl OpenIdConfiguration {
    pub fn new(issuer: &str) -> Self {
        let issuer = issuer.trim_end_matches('/');
        Self {
            issuer: issuer.to_string(),
            authorization_endpoint: format!("{}/auth", issuer),
            token_endpoint: format!("{}/token", issuer),
            jwks_uri: format!("{}/keys", issuer),
            response_types_supported: vec!["code".to_string()],
            grant_types_supported: vec!["authorization_code".to_string()],
            subject_types_supported: vec!["public".to_string()],
            id_token_signing_alg_values_supported: vec!["RS256".to_string()],
            scopes_supported: SUPPORTED_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_endpoint_auth_methods_supported: vec![
                "client_secret_basic".to_string(),
                "client_secret_post".to_string(),
            ],
            claims_supported: [
                "iss",
                "sub",
                "aud",
                "exp",
                "iat",
                "nonce",
                "name",
                "preferred_username",
                "email",
                "email_verified",
                "groups",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// GET /.well-known/openid-configuration - discovery metadata.
pub async fn openid_configuration_handler(
    Extension(state): Extension<Arc<OidcState>>,
) -> Json<OpenIdConfiguration> {
    Json(OpenIdConfiguration::new(&state.issuer))
}

/// GET /keys - the public JWKS.
pub async fn jwks_handler(Extension(state): Extension<Arc<OidcState>>) -> Json<serde_json::Value> {
    Json(state.signer.jwks())
}
