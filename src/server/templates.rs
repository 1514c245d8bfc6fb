//! HTML rendering for the login form and user-facing error pages.
//!
//! Templates are embedded at compile time and registered once at startup,
//! so a render failure at request time can only come from the data handed
//! in; it degrades to a bare preformatted page rather than an empty reply.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// Data for the login form.
#[derive(Debug, Serialize)]
pub struct LoginPage<'a> {
    /// Where the form posts to (root-relative).
    pub post_url: &'a str,
    /// The authorization session value carried through the form.
    pub session: &'a str,
    /// Echoed login after a failed attempt.
    pub login: &'a str,
    /// Set after a failed attempt to show the retry banner.
    pub login_failed: bool,
    pub issuer: &'a str,
}

/// Registry of embedded page templates.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates").finish_non_exhaustive()
    }
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string("login", include_str!("../../templates/login.hbs"))
            .context("failed to register login template")?;
        registry
            .register_template_string("error", include_str!("../../templates/error.hbs"))
            .context("failed to register error template")?;
        Ok(Self { registry })
    }

    pub fn render_login(&self, page: &LoginPage<'_>) -> String {
        match self.registry.render("login", page) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("failed to render login template: {}", e);
                fallback_page("Internal error", "Could not render the login page.")
            }
        }
    }

    pub fn render_error(&self, error_type: &str, error: &str) -> String {
        let data = serde_json::json!({
            "error_type": error_type,
            "error": error,
        });
        match self.registry.render("error", &data) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("failed to render error template: {}", e);
                fallback_page(error_type, error)
            }
        }
    }
}

fn fallback_page(title: &str, body: &str) -> String {
    format!("<h1>{}</h1>\n<pre>{}</pre>\n", title, body)
}
