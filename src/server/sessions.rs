//! In-memory authorization sessions keyed by authorization code.
//!
//! A [`Connection`] exists from the moment `/auth` admits a request until
//! the token endpoint redeems its code (or the session expires). The store
//! is the only mutable shared structure on the hot path; every operation
//! takes one critical section, and [`SessionStore::consume`] removes under
//! the write lock so a code can be redeemed at most once even under
//! concurrent token requests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::server::authenticator::AuthResponse;

/// How long an unredeemed authorization session stays valid.
pub const SESSION_TTL: Duration = Duration::from_secs(600);

/// A transient authorization session.
#[derive(Debug, Clone)]
pub struct Connection {
    /// The authorization code, unique key in the store.
    pub code: String,
    /// Id of the admitted client. Clients are immutable and outlive every
    /// connection, so the registry resolves the record on demand.
    pub client_id: String,
    /// The redirect URI validated at `/auth`; the token endpoint requires
    /// an exact repeat.
    pub redirect_uri: String,
    /// Opaque client value echoed on the success redirect.
    pub state: String,
    /// Optional value copied into the ID Token when present.
    pub nonce: Option<String>,
    /// Admitted scopes; always contains `openid`.
    pub scopes: Vec<String>,
    /// Authenticator outcome, written only by the login broker.
    pub response: Option<AuthResponse>,
    pub created_at: Instant,
}

impl Connection {
    pub fn new(
        code: String,
        client_id: String,
        redirect_uri: String,
        state: String,
        nonce: Option<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            code,
            client_id,
            redirect_uri,
            state,
            nonce,
            scopes,
            response: None,
            created_at: Instant::now(),
        }
    }

    fn expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

#[derive(Debug, Error)]
#[error("authorization code already present in store")]
pub struct CodeCollision;

/// Concurrent map from authorization code to [`Connection`].
#[derive(Debug)]
pub struct SessionStore {
    connections: RwLock<HashMap<String, Connection>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Inserts a fresh connection. Fails iff the code is already present;
    /// the caller mints a new code and retries.
    pub async fn insert(&self, conn: Connection) -> Result<(), CodeCollision> {
        let mut connections = self.connections.write().await;
        if connections.contains_key(&conn.code) {
            return Err(CodeCollision);
        }
        connections.insert(conn.code.clone(), conn);
        Ok(())
    }

    /// Non-destructive lookup used by the login broker. Expired sessions
    /// read as missing and are dropped.
    pub async fn load(&self, code: &str) -> Option<Connection> {
        let connections = self.connections.read().await;
        if let Some(conn) = connections.get(code) {
            if !conn.expired(self.ttl) {
                return Some(conn.clone());
            }
            drop(connections);
            self.connections.write().await.remove(code);
        }
        None
    }

    /// Overwrites a connection, used once to record the authenticator
    /// response.
    pub async fn update(&self, code: &str, conn: Connection) {
        self.connections
            .write()
            .await
            .insert(code.to_string(), conn);
    }

    /// Atomic read-and-delete used by the token endpoint. The removal
    /// happens under the write lock, so of any number of concurrent
    /// redemptions of the same code exactly one succeeds.
    pub async fn consume(&self, code: &str) -> Option<Connection> {
        let conn = self.connections.write().await.remove(code)?;
        if conn.expired(self.ttl) {
            return None;
        }
        Some(conn)
    }

    /// Drops expired sessions; returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut connections = self.connections.write().await;
        let before = connections.len();
        connections.retain(|_, conn| !conn.expired(self.ttl));
        before - connections.len()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

/// Generates a URL-safe random string from `bytes` bytes of OS entropy.
pub fn random_urlsafe(bytes: usize) -> String {
    let mut rng = rand::rng();
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// Mints a fresh authorization code: 32 random bytes, base64url.
pub fn mint_code() -> String {
    random_urlsafe(32)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn connection(code: &str) -> Connection {
        Connection::new(
            code.to_string(),
            "test-client".to_string(),
            "http://127.0.0.1:5555/callback".to_string(),
            "S1".to_string(),
            None,
            vec!["openid".to_string()],
        )
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_codes() {
        let store = SessionStore::new();
        store.insert(connection("c1")).await.unwrap();
        assert!(store.insert(connection("c1")).await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn load_is_non_destructive() {
        let store = SessionStore::new();
        store.insert(connection("c1")).await.unwrap();
        assert!(store.load("c1").await.is_some());
        assert!(store.load("c1").await.is_some());
        assert!(store.load("missing").await.is_none());
    }

    #[tokio::test]
    async fn consume_redeems_at_most_once() {
        let store = SessionStore::new();
        store.insert(connection("c1")).await.unwrap();
        assert!(store.consume("c1").await.is_some());
        assert!(store.consume("c1").await.is_none());
        assert!(store.load("c1").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_consumers_race_to_one_winner() {
        let store = Arc::new(SessionStore::new());
        store.insert(connection("c1")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(
                async move { store.consume("c1").await.is_some() },
            ));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn expired_sessions_read_as_missing_and_sweep_away() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        store.insert(connection("c1")).await.unwrap();
        store.insert(connection("c2")).await.unwrap();
        assert!(store.load("c1").await.is_none());
        assert!(store.consume("c2").await.is_none());

        store.insert(connection("c3")).await.unwrap();
        assert_eq!(store.sweep().await, 1);
        assert!(store.is_empty().await);
    }

    #[test]
    fn minted_codes_are_unique_and_urlsafe() {
        let a = mint_code();
        let b = mint_code();
        assert_ne!(a, b);
        assert!(a.len() >= 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
