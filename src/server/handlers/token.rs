//! Token endpoint: `POST {root}/token`.
//!
//! Authenticates the client, redeems the authorization code (exactly
//! once), and returns the signed ID Token. Every response, success or
//! error, is JSON and carries `Cache-Control: no-store` and
//! `Pragma: no-cache`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::RawForm,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::server::authenticator::Verdict;
use crate::server::handlers::parse_form_first;
use crate::server::idtoken::{build_claims, unix_now};
use crate::server::sessions::random_urlsafe;
use crate::server::signing::Signer as _;
use crate::server::state::OidcState;

/// Successful token response body.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub id_token: String,
}

/// OIDC/OAuth2 token-endpoint error taxonomy.
///
/// Client authentication failures and session lookup failures use
/// distinct codes and are never conflated.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unsupported grant type")]
    UnsupportedGrantType,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("invalid client credentials")]
    InvalidClient,
    #[error("{0}")]
    InvalidGrant(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl TokenError {
    fn code(&self) -> &'static str {
        match self {
            TokenError::UnsupportedGrantType => "unsupported_grant_type",
            TokenError::InvalidRequest(_) => "invalid_request",
            TokenError::InvalidClient => "invalid_client",
            TokenError::InvalidGrant(_) => "invalid_grant",
            TokenError::Internal(_) => "server_error",
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = match &self {
            TokenError::InvalidClient => StatusCode::UNAUTHORIZED,
            TokenError::Internal(e) => {
                tracing::error!("token endpoint internal error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };

        let mut body = serde_json::Map::new();
        body.insert("error".to_string(), Value::from(self.code()));
        match &self {
            TokenError::InvalidRequest(desc) | TokenError::InvalidGrant(desc) => {
                body.insert("error_description".to_string(), Value::from(desc.as_str()));
            }
            // The internal error detail stays in the log
            _ => {}
        }

        (status, no_store_headers(), Json(Value::Object(body))).into_response()
    }
}

fn no_store_headers() -> [(header::HeaderName, &'static str); 2] {
    [
        (header::CACHE_CONTROL, "no-store"),
        (header::PRAGMA, "no-cache"),
    ]
}

/// POST /token - exchanges an authorization code for a signed ID Token.
pub async fn token_handler(
    Extension(state): Extension<Arc<OidcState>>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    match exchange(&state, &headers, &body).await {
        Ok(response) => (
            StatusCode::OK,
            no_store_headers(),
            Json(response),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn exchange(
    state: &OidcState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<TokenResponse, TokenError> {
    let form = parse_form_first(body);

    if form.get("grant_type").map(String::as_str) != Some("authorization_code") {
        return Err(TokenError::UnsupportedGrantType);
    }

    let code = form.get("code").cloned().unwrap_or_default();
    if code.is_empty() {
        return Err(TokenError::InvalidRequest("Required param: code.".to_string()));
    }

    // Client authentication comes before code consumption: a wrong secret
    // must leave the code redeemable.
    let (client_id, client_secret) = client_credentials(headers, &form)?;
    let client = state
        .clients
        .authenticate(&client_id, &client_secret)
        .ok_or(TokenError::InvalidClient)?;

    // Atomic redemption: a replay or a concurrent exchange races to one
    // winner, everyone else sees invalid_grant.
    let conn = state
        .sessions
        .consume(&code)
        .await
        .ok_or_else(invalid_code)?;

    if conn.client_id != client.id {
        return Err(TokenError::InvalidGrant(
            "Invalid or expired code parameter.".to_string(),
        ));
    }

    if form.get("redirect_uri").map(String::as_str) != Some(conn.redirect_uri.as_str()) {
        return Err(TokenError::InvalidRequest(
            "redirect_uri did not match URI from initial request.".to_string(),
        ));
    }

    let auth = match conn.response.as_ref() {
        Some(response) if response.verdict == Verdict::LoginOk => response,
        _ => return Err(invalid_code()),
    };

    let now = unix_now();
    let claims = build_claims(&state.issuer, &conn, auth, now);
    let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
    let id_token = state
        .signer
        .sign(header, &Value::Object(claims))
        .map_err(TokenError::Internal)?;

    tracing::debug!(client = %client.id, "authorization code redeemed");

    Ok(TokenResponse {
        // Opaque and unpredictable; there is no introspection endpoint, so
        // nothing ever looks it up again.
        access_token: random_urlsafe(48),
        token_type: "Bearer".to_string(),
        id_token,
    })
}

fn invalid_code() -> TokenError {
    TokenError::InvalidGrant("Invalid or expired code parameter.".to_string())
}

/// Resolves client credentials: HTTP Basic is preferred, with both
/// components URL-decoded per RFC 6749 §2.3.1; form fields are the
/// fallback.
fn client_credentials(
    headers: &HeaderMap,
    form: &HashMap<String, String>,
) -> Result<(String, String), TokenError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| malformed_basic_auth())?;
        if let Some(encoded) = value.strip_prefix("Basic ") {
            let decoded = BASE64_STANDARD
                .decode(encoded.trim())
                .map_err(|_| malformed_basic_auth())?;
            let text = String::from_utf8(decoded).map_err(|_| malformed_basic_auth())?;
            let (id, secret) = text.split_once(':').ok_or_else(malformed_basic_auth)?;
            let id = urlencoding::decode(id).map_err(|_| malformed_basic_auth())?;
            let secret = urlencoding::decode(secret).map_err(|_| malformed_basic_auth())?;
            return Ok((id.into_owned(), secret.into_owned()));
        }
    }

    Ok((
        form.get("client_id").cloned().unwrap_or_default(),
        form.get("client_secret").cloned().unwrap_or_default(),
    ))
}

fn malformed_basic_auth() -> TokenError {
    TokenError::InvalidRequest("Malformed HTTP Basic authorization header.".to_string())
}
