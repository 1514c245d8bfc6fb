//! HTTP service assembly: routes, middleware, and the server loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Extension, Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::JanusConfig;
use crate::server::handlers::{
    authorize::authorize_handler,
    discovery::{jwks_handler, openid_configuration_handler},
    login::login_handler,
    token::token_handler,
};
use crate::server::state::OidcState;

/// How often expired authorization sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Builds the OIDC router, mounted under the state's root prefix.
///
/// Requests that match no endpoint fall through to the static file
/// service when `web_root` is given.
pub fn router(state: Arc<OidcState>, web_root: Option<&str>) -> Router {
    let endpoints = Router::new()
        .route(
            "/.well-known/openid-configuration",
            get(openid_configuration_handler),
        )
        .route("/auth", get(authorize_handler))
        .route("/auth/login", post(login_handler))
        .route("/token", post(token_handler))
        .route("/keys", get(jwks_handler));

    let mut app = if state.root.is_empty() {
        endpoints
    } else {
        Router::new().nest(&state.root, endpoints)
    };

    if let Some(dir) = web_root {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(Extension(state))
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
}

/// Spawns the periodic sweep of expired authorization sessions.
pub fn start_session_sweeper(state: Arc<OidcState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.sessions.sweep().await;
            if removed > 0 {
                tracing::info!("swept {} expired authorization sessions", removed);
            }
        }
    });
}

/// Binds the listener and serves until ctrl-c.
pub async fn start(config: &JanusConfig, state: Arc<OidcState>) -> anyhow::Result<()> {
    start_session_sweeper(state.clone());

    let app = router(state.clone(), config.web_root.as_deref());

    let addr = config
        .bind_address
        .clone()
        .unwrap_or_else(|| "127.0.0.1:7480".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Starting HTTP server on http://{}", addr);
    info!(
        "discovery document at {}{}/.well-known/openid-configuration",
        addr, state.root
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// Middleware to log incoming requests and outgoing responses.
async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri_path = req.uri().path().to_string();
    tracing::debug!("Received request: {} {}", method, uri_path);

    let response = next.run(req).await;

    tracing::debug!(
        "Sending response: {} for {} {}",
        response.status(),
        method,
        uri_path
    );
    response
}
