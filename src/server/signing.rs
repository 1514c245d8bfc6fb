//! ID Token signing and the published JWKS.
//!
//! One RSA signing key lives in memory for the process lifetime. It is
//! either generated at startup or loaded from an operator-provided PEM
//! file; the matching public key is published as a single-entry JWKS so
//! relying parties can verify issued tokens.

use anyhow::{Context, Result};
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_ENGINE;
use jsonwebtoken::{EncodingKey, Header};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use sha2::{Digest, Sha256};

/// Key length for generated signing keys.
const GENERATED_KEY_BITS: usize = 2048;

pub trait Signer: Send + Sync {
    fn kid(&self) -> &str;
    fn sign(&self, header: Header, claims: &serde_json::Value) -> Result<String>;
    fn jwks(&self) -> serde_json::Value;
}

pub type DynSigner = Arc<dyn Signer>;

/// RS256 signer holding the private key and its public JWK.
#[derive(Clone)]
pub struct RsaSigner {
    kid: String,
    encoding_key: EncodingKey,
    jwk: serde_json::Value,
}

impl RsaSigner {
    /// Generates a fresh keypair. Used when no key file is configured;
    /// tokens signed before a restart will not verify afterwards.
    pub fn generate() -> Result<Self> {
        let mut rng = rsa::rand_core::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, GENERATED_KEY_BITS)
            .context("failed to generate RSA signing key")?;
        Self::from_private_key(private_key)
    }

    /// Builds a signer from a PEM-encoded RSA private key (PKCS#8 or
    /// PKCS#1).
    pub fn from_pem(key_pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(key_pem))
            .context("failed to parse RSA private key PEM")?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self> {
        let pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .context("failed to encode private key to PEM")?;
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .context("failed to create encoding key from pem")?;

        let n_bytes = private_key.n().to_bytes_be();
        let e_bytes = private_key.e().to_bytes_be();

        // kid is SHA-256(n || e), stable across restarts with the same key
        let mut hasher = Sha256::new();
        hasher.update(&n_bytes);
        hasher.update(&e_bytes);
        let kid = hex::encode(hasher.finalize());

        let jwk = serde_json::json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": kid,
            "n": BASE64_ENGINE.encode(&n_bytes),
            "e": BASE64_ENGINE.encode(&e_bytes),
        });

        Ok(RsaSigner {
            kid,
            encoding_key,
            jwk,
        })
    }
}

impl Signer for RsaSigner {
    fn kid(&self) -> &str {
        &self.kid
    }

    fn sign(&self, mut header: Header, claims: &serde_json::Value) -> Result<String> {
        header.kid = Some(self.kid.clone());
        let token = jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .context("failed to encode jwt")?;
        Ok(token)
    }

    fn jwks(&self) -> serde_json::Value {
        serde_json::json!({ "keys": [self.jwk.clone()] })
    }
}

/// Loads a signer from a key file when configured, otherwise generates an
/// ephemeral keypair.
pub fn load_signer(key_path: Option<&str>) -> Result<DynSigner> {
    let signer = match key_path {
        Some(path) => {
            let pem = std::fs::read_to_string(path).context("read private key")?;
            RsaSigner::from_pem(&pem).context("create signer from key file")?
        }
        None => {
            tracing::info!("no signing key configured, generating an ephemeral RSA keypair");
            RsaSigner::generate()?
        }
    };
    Ok(Arc::new(signer))
}
