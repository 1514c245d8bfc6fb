//! HTTP handlers for the OIDC endpoints.

pub mod authorize;
pub mod discovery;
pub mod login;
pub mod token;

use std::collections::HashMap;

/// Parses an `application/x-www-form-urlencoded` body, flattening repeated
/// fields to their first value.
pub(crate) fn parse_form_first(body: &[u8]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_fields_keep_the_first_value() {
        let params = parse_form_first(b"a=1&b=two&a=3&empty=");
        assert_eq!(params["a"], "1");
        assert_eq!(params["b"], "two");
        assert_eq!(params["empty"], "");
    }

    #[test]
    fn values_are_percent_decoded() {
        let params = parse_form_first(b"login=a%40b&state=x+y");
        assert_eq!(params["login"], "a@b");
        assert_eq!(params["state"], "x y");
    }
}
