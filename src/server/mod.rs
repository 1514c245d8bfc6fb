//! HTTP server components: the OIDC state machine, its endpoints, and the
//! signing, session, and template machinery behind them.

pub mod authenticator;
pub mod clients;
pub mod handlers;
pub mod idtoken;
pub mod service;
pub mod sessions;
pub mod signing;
pub mod state;
pub mod templates;
