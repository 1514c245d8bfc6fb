//! Default helpers referenced from `#[serde(default = "...")]` attributes.

pub fn default_issuer() -> String {
    "http://127.0.0.1:7480/oidc".to_string()
}

pub fn default_root_path() -> String {
    "/oidc".to_string()
}

pub fn default_bind_address() -> Option<String> {
    Some("127.0.0.1:7480".to_string())
}
