//! Login endpoint: `POST {root}/auth/login`.
//!
//! Drives the configured authenticator with the submitted form, records
//! the outcome on the authorization session, and either redirects back to
//! the relying party with the code or re-renders the login form.

use std::sync::Arc;

use axum::{
    Extension,
    extract::RawForm,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use url::Url;

use crate::server::authenticator::{AuthRequest, Verdict};
use crate::server::handlers::parse_form_first;
use crate::server::state::OidcState;
use crate::server::templates::LoginPage;

/// POST /auth/login - collects credentials and drives the authenticator.
pub async fn login_handler(
    Extension(state): Extension<Arc<OidcState>>,
    RawForm(body): RawForm,
) -> Response {
    let params = parse_form_first(&body);

    let session = params.get("session").cloned().unwrap_or_default();
    let conn = match state.sessions.load(&session).await {
        Some(conn) => conn,
        None => {
            return state
                .error_page("Bad request", "Invalid session")
                .into_response();
        }
    };

    let request = AuthRequest {
        session: session.clone(),
        client_id: conn.client_id.clone(),
        scopes: conn.scopes.clone(),
        params,
    };
    let login = request.params.get("login").cloned().unwrap_or_default();

    // The authenticator may be arbitrarily slow; no session-store lock is
    // held across this call.
    let response = state.authenticator.authenticate(request).await;

    match response.verdict {
        Verdict::LoginOk => {
            if let Some(client) = state.clients.find_by_id(&conn.client_id)
                && !client.roles.is_empty()
                && !response.groups.iter().any(|g| client.roles.contains(g))
            {
                tracing::debug!(
                    client = %conn.client_id,
                    login = %response.login,
                    "login rejected: user belongs to none of the client's roles"
                );
                return state
                    .error_page("Access denied", "You are not authorized to use this client")
                    .into_response();
            }

            // Record the outcome before anything is shown to the user, so
            // a concurrent token exchange sees consistent state.
            let mut conn = conn;
            conn.response = Some(response);
            let redirect_uri = conn.redirect_uri.clone();
            let request_state = conn.state.clone();
            state.sessions.update(&session, conn).await;

            let mut url = match Url::parse(&redirect_uri) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("registered redirect_uri failed to parse: {}", e);
                    return state
                        .error_page("Internal error", "Invalid redirect URI")
                        .into_response();
                }
            };
            url.query_pairs_mut()
                .append_pair("code", &session)
                .append_pair("state", &request_state);

            tracing::debug!("login accepted, redirecting back to the client");
            (
                StatusCode::FOUND,
                [(header::LOCATION, url.to_string())],
            )
                .into_response()
        }
        Verdict::LoginFailed => {
            let mut conn = conn;
            conn.response = Some(response);
            state.sessions.update(&session, conn).await;

            Html(state.templates.render_login(&LoginPage {
                post_url: &state.login_post_url(),
                session: &session,
                login: &login,
                login_failed: true,
                issuer: &state.issuer,
            }))
            .into_response()
        }
        Verdict::Invalid => state
            .error_page("Internal error", "Bad response from callback")
            .into_response(),
    }
}
