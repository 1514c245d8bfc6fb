//! Authorization endpoint: `GET {root}/auth`.
//!
//! Validates the authorization request, creates the session that binds the
//! freshly minted code to the client, and renders the login form. Every
//! validation failure renders a human-readable error page and leaves no
//! session behind.

use std::sync::Arc;

use axum::{
    Extension,
    extract::Query,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::server::sessions::{Connection, mint_code};
use crate::server::state::OidcState;
use crate::server::templates::LoginPage;

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub client_id: Option<String>,
    pub scope: Option<String>,
    pub response_type: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
}

/// GET /auth - authorization endpoint.
///
/// Checks, in order: client_id present, client registered, `openid` scope
/// requested, every scope allowed for the client, `response_type=code`,
/// redirect_uri registered. The first failure renders the error page.
pub async fn authorize_handler(
    Extension(state): Extension<Arc<OidcState>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let client_id = match params.client_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            return state
                .error_page("Bad request", r#"Missing required field "client_id""#)
                .into_response();
        }
    };

    let client = match state.clients.find_by_id(client_id) {
        Some(client) => client,
        None => {
            return state
                .error_page("Bad request", &format!(r#"unknown client "{}""#, client_id))
                .into_response();
        }
    };

    // OpenID Connect requests MUST carry the openid scope value
    let scopes: Vec<String> = params
        .scope
        .as_deref()
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if !scopes.iter().any(|s| s == "openid") {
        return state
            .error_page("Bad request", r#"Missing required scope: "openid""#)
            .into_response();
    }

    for scope in &scopes {
        if !state.clients.scope_allowed(client, scope) {
            return state
                .error_page("Bad request", &format!(r#"Unrecognized scope: "{}""#, scope))
                .into_response();
        }
    }

    // Only the authorization-code flow is supported
    if params.response_type.as_deref() != Some("code") {
        return state
            .error_page("Bad request", r#"Field "response_type" must be "code""#)
            .into_response();
    }

    let redirect_uri = params.redirect_uri.as_deref().unwrap_or("");
    if !state.clients.redirect_uri_allowed(client, redirect_uri) {
        return state
            .error_page(
                "Bad request",
                &format!(r#"Unregistered redirect_uri ("{}")"#, redirect_uri),
            )
            .into_response();
    }

    let request_state = params.state.unwrap_or_default();
    let nonce = params.nonce.filter(|n| !n.is_empty());

    // Mint the code and store the session. A code collision is treated as
    // impossible by construction; on the astronomically-unlikely clash we
    // mint again.
    let code = loop {
        let code = mint_code();
        let conn = Connection::new(
            code.clone(),
            client.id.clone(),
            redirect_uri.to_string(),
            request_state.clone(),
            nonce.clone(),
            scopes.clone(),
        );
        if state.sessions.insert(conn).await.is_ok() {
            break code;
        }
        tracing::warn!("authorization code collision, minting a new code");
    };

    tracing::debug!(client = %client.id, "authorization request admitted");

    Html(state.templates.render_login(&LoginPage {
        post_url: &state.login_post_url(),
        session: &code,
        login: "",
        login_failed: false,
        issuer: &state.issuer,
    }))
    .into_response()
}
