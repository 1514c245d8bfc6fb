//! ID Token claim assembly.
//!
//! Claims are collected into an insertion-ordered map (`serde_json` is
//! built with `preserve_order`) so the serialized token always reads
//! `iss, sub, aud, exp, iat`, then the scope-gated claims, then whatever
//! extras the authenticator supplied.

use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::server::authenticator::AuthResponse;
use crate::server::sessions::Connection;

/// Issued tokens are valid for one hour.
pub const TOKEN_LIFETIME_SECS: u64 = 3600;

/// Claim names the authenticator can never overwrite.
pub const RESERVED_CLAIMS: &[&str] = &[
    "iss",
    "sub",
    "aud",
    "exp",
    "iat",
    "nonce",
    "email",
    "email_verified",
    "name",
    "preferred_username",
    "groups",
];

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Builds the claim set for one redeemed authorization session.
///
/// `auth` must be a successful authenticator response; its identity fields
/// are projected into claims according to the admitted scopes.
pub fn build_claims(
    issuer: &str,
    conn: &Connection,
    auth: &AuthResponse,
    now: u64,
) -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert("iss".to_string(), Value::from(issuer));
    claims.insert("sub".to_string(), Value::from(auth.login.as_str()));
    claims.insert("aud".to_string(), Value::from(conn.client_id.as_str()));
    claims.insert("exp".to_string(), Value::from(now + TOKEN_LIFETIME_SECS));
    claims.insert("iat".to_string(), Value::from(now));

    if let Some(nonce) = conn.nonce.as_deref()
        && !nonce.is_empty()
    {
        claims.insert("nonce".to_string(), Value::from(nonce));
    }

    let has_scope = |scope: &str| conn.scopes.iter().any(|s| s == scope);

    if has_scope("profile") {
        claims.insert(
            "preferred_username".to_string(),
            Value::from(auth.login.as_str()),
        );
        claims.insert("name".to_string(), Value::from(auth.name.as_str()));
    }

    if has_scope("email") && !auth.mail.is_empty() {
        claims.insert("email".to_string(), Value::from(auth.mail.as_str()));
        claims.insert("email_verified".to_string(), Value::from(true));
    }

    if has_scope("groups") && !auth.groups.is_empty() {
        claims.insert("groups".to_string(), Value::from(auth.groups.clone()));
    }

    // Reserved names always keep the value computed above.
    for (key, value) in &auth.claims {
        if RESERVED_CLAIMS.contains(&key.as_str()) {
            tracing::warn!("authenticator claim {:?} collides with a standard claim, ignoring", key);
            continue;
        }
        claims.insert(key.clone(), value.clone());
    }

    claims
}
