//! Authorization endpoint validation and session creation.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn valid_request_renders_login_and_stores_one_session() {
    let state = test_state();
    let router = test_router(state.clone());

    let code = obtain_code(&router).await;
    assert!(!code.is_empty());
    assert_eq!(state.sessions.len().await, 1);
    assert!(state.sessions.load(&code).await.is_some());
}

#[tokio::test]
async fn login_page_posts_back_under_the_root_prefix() {
    let state = test_state();
    let router = test_router(state.clone());

    let uri = format!(
        "/oidc/auth?client_id={}&scope=openid&response_type=code&redirect_uri={}&state=S1",
        CLIENT_ID,
        urlencoding::encode(REDIRECT_URI)
    );
    let (status, _, body) = get(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"action="/oidc/auth/login""#));
}

#[tokio::test]
async fn missing_client_id_is_rejected() {
    let state = test_state();
    let router = test_router(state.clone());

    let (status, _, body) = get(&router, "/oidc/auth?scope=openid&response_type=code").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"Missing required field "client_id""#));
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn unknown_client_is_rejected() {
    let state = test_state();
    let router = test_router(state.clone());

    let (_, _, body) = get(
        &router,
        "/oidc/auth?client_id=ghost&scope=openid&response_type=code",
    )
    .await;
    assert!(body.contains(r#"unknown client "ghost""#));
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn openid_scope_is_required() {
    let state = test_state();
    let router = test_router(state.clone());

    let uri = format!(
        "/oidc/auth?client_id={}&scope=profile&response_type=code&redirect_uri={}",
        CLIENT_ID,
        urlencoding::encode(REDIRECT_URI)
    );
    let (_, _, body) = get(&router, &uri).await;
    assert!(body.contains(r#"Missing required scope: "openid""#));
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn unknown_scopes_are_rejected() {
    let state = test_state();
    let router = test_router(state.clone());

    let uri = format!(
        "/oidc/auth?client_id={}&scope=openid%20unknownscope&response_type=code&redirect_uri={}&state=S1",
        CLIENT_ID,
        urlencoding::encode(REDIRECT_URI)
    );
    let (_, _, body) = get(&router, &uri).await;
    assert!(body.contains(r#"Unrecognized scope: "unknownscope""#));
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn client_specific_scopes_are_honored() {
    let mut client = test_client();
    client.scopes = vec!["payroll".to_string()];
    let state = test_state_with(vec![client], std::sync::Arc::new(TestAuthenticator));
    let router = test_router(state.clone());

    let uri = format!(
        "/oidc/auth?client_id={}&scope=openid%20payroll&response_type=code&redirect_uri={}",
        CLIENT_ID,
        urlencoding::encode(REDIRECT_URI)
    );
    let (status, _, body) = get(&router, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Unrecognized scope"));
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn response_type_must_be_code() {
    let state = test_state();
    let router = test_router(state.clone());

    let uri = format!(
        "/oidc/auth?client_id={}&scope=openid&response_type=token&redirect_uri={}",
        CLIENT_ID,
        urlencoding::encode(REDIRECT_URI)
    );
    let (_, _, body) = get(&router, &uri).await;
    assert!(body.contains(r#"Field "response_type" must be "code""#));
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn unregistered_redirect_uri_is_rejected() {
    let state = test_state();
    let router = test_router(state.clone());

    let uri = format!(
        "/oidc/auth?client_id={}&scope=openid&response_type=code&redirect_uri={}",
        CLIENT_ID,
        urlencoding::encode("http://evil/")
    );
    let (_, _, body) = get(&router, &uri).await;
    assert!(body.contains("Unregistered redirect_uri"));
    assert!(state.sessions.is_empty().await);
}
