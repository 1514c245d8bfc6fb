//! Janus is a small OpenID Connect identity provider implementing the
//! Authorization Code flow.
//!
//! The server admits authorization requests from registered clients, collects
//! end-user credentials through a login form, verifies them against a
//! pluggable [`Authenticator`](server::authenticator::Authenticator), and
//! issues RS256-signed ID Tokens at the token endpoint. Discovery metadata
//! and the public JWKS are served alongside.
//!
//! The library exposes everything needed to embed the provider in another
//! application: build an [`OidcState`](server::state::OidcState) from a
//! client registry, a signer, and an authenticator, then mount
//! [`server::service::router`] wherever an axum `Router` fits. The `janus`
//! binary wires the same pieces from a YAML configuration file.

pub mod config;
pub mod errors;
pub mod server;
