//! Shared harness for the endpoint integration tests: a provider with one
//! registered client and a fixed-credential authenticator, driven through
//! `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use tower::ServiceExt;

use janus::server::authenticator::{AuthRequest, AuthResponse, Authenticator, Verdict};
use janus::server::clients::{Client, ClientRegistry};
use janus::server::service;
use janus::server::signing::{DynSigner, RsaSigner};
use janus::server::state::OidcState;

pub const ISSUER: &str = "http://127.0.0.1:7480/oidc";
pub const ROOT: &str = "/oidc";
pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "client-secret";
pub const REDIRECT_URI: &str = "http://127.0.0.1:5555/callback";

/// Accepts login `admin` / password `secret`, mirroring a directory hit.
pub struct TestAuthenticator;

#[async_trait]
impl Authenticator for TestAuthenticator {
    async fn authenticate(&self, request: AuthRequest) -> AuthResponse {
        let login = request.params.get("login").map(String::as_str).unwrap_or("");
        let password = request
            .params
            .get("password")
            .map(String::as_str)
            .unwrap_or("");
        if login == "admin" && password == "secret" {
            AuthResponse {
                verdict: Verdict::LoginOk,
                login: "admin".to_string(),
                name: "Charlie Root".to_string(),
                mail: "admin@example.com".to_string(),
                groups: vec!["admins".to_string()],
                claims: serde_json::Map::new(),
            }
        } else {
            AuthResponse::login_failed()
        }
    }
}

pub fn test_client() -> Client {
    Client {
        id: CLIENT_ID.to_string(),
        secret: CLIENT_SECRET.to_string(),
        redirect_uris: vec![REDIRECT_URI.to_string()],
        scopes: vec![],
        roles: vec![],
    }
}

/// Keypair generation is slow, so every test in a binary shares one key.
pub fn test_signer() -> DynSigner {
    static SIGNER: OnceLock<DynSigner> = OnceLock::new();
    SIGNER
        .get_or_init(|| Arc::new(RsaSigner::generate().expect("generate signing key")))
        .clone()
}

pub fn test_state_with(
    clients: Vec<Client>,
    authenticator: Arc<dyn Authenticator>,
) -> Arc<OidcState> {
    Arc::new(
        OidcState::new(
            ISSUER,
            ROOT,
            ClientRegistry::new(clients),
            test_signer(),
            authenticator,
        )
        .expect("build state"),
    )
}

pub fn test_state() -> Arc<OidcState> {
    test_state_with(vec![test_client()], Arc::new(TestAuthenticator))
}

pub fn test_router(state: Arc<OidcState>) -> Router {
    service::router(state, None)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, req).await
}

pub async fn post_form(router: &Router, uri: &str, form: &str) -> (StatusCode, HeaderMap, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(router, req).await
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let resp = router.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

/// Pulls the session value out of the rendered login form.
pub fn extract_session(html: &str) -> String {
    let marker = r#"name="session" value=""#;
    let start = html.find(marker).expect("login form carries a session") + marker.len();
    let end = html[start..].find('"').expect("closing quote") + start;
    html[start..end].to_string()
}

/// Runs `/auth` for the standard client and returns the minted code.
pub async fn obtain_code(router: &Router) -> String {
    obtain_code_with(router, "openid profile email", "S1", None).await
}

pub async fn obtain_code_with(
    router: &Router,
    scope: &str,
    state: &str,
    nonce: Option<&str>,
) -> String {
    let mut uri = format!(
        "/oidc/auth?client_id={}&scope={}&response_type=code&redirect_uri={}&state={}",
        CLIENT_ID,
        urlencoding::encode(scope),
        urlencoding::encode(REDIRECT_URI),
        state,
    );
    if let Some(nonce) = nonce {
        uri.push_str(&format!("&nonce={}", nonce));
    }
    let (status, _, body) = get(router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    extract_session(&body)
}

/// Completes the login step for `code` with the standard credentials and
/// returns the redirect response.
pub async fn complete_login(router: &Router, code: &str) -> (StatusCode, HeaderMap, String) {
    post_form(
        router,
        "/oidc/auth/login",
        &format!("session={}&login=admin&password=secret", code),
    )
    .await
}

/// Exchanges `code` at the token endpoint with form-posted credentials.
pub async fn exchange_code(router: &Router, code: &str) -> (StatusCode, HeaderMap, String) {
    let form = format!(
        "grant_type=authorization_code&code={}&redirect_uri={}&client_id={}&client_secret={}",
        code,
        urlencoding::encode(REDIRECT_URI),
        CLIENT_ID,
        CLIENT_SECRET,
    );
    post_form(router, "/oidc/token", &form).await
}
