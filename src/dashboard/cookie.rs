//! Session cookie header values.

use crate::{auth::SessionId, config::App};
use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub domain: Option<String>,
    pub secure: bool,
}

impl CookieSettings {
    #[must_use]
    pub fn from_app(app: &App) -> Self {
        let domain = app.cookie_domain.trim();
        Self {
            name: app.cookie_name.clone(),
            domain: (!domain.is_empty()).then(|| domain.to_string()),
            secure: app.cookie_secure,
        }
    }

    fn attributes(&self, max_age: u64) -> String {
        let mut attributes = format!("Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
        if let Some(domain) = &self.domain {
            attributes.push_str("; Domain=");
            attributes.push_str(domain);
        }
        // Only mark cookies secure when the dashboard is served over HTTPS.
        if self.secure {
            attributes.push_str("; Secure");
        }
        attributes
    }

    /// Persistent cookie carrying the session identifier. `max_age` is rounded up
    /// to whole seconds.
    ///
    /// # Errors
    /// Returns an error if the identifier or domain contain invalid header bytes.
    pub fn session_cookie(
        &self,
        session: &SessionId,
        max_age: Duration,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        let cookie = format!(
            "{}={}; {}",
            self.name,
            session.as_str(),
            self.attributes(max_age.as_secs() + u64::from(max_age.subsec_nanos() > 0))
        );
        HeaderValue::from_str(&cookie)
    }

    /// Expire the cookie in the browser.
    ///
    /// # Errors
    /// Returns an error if the domain contains invalid header bytes.
    pub fn clear_session_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!("{}=; {}", self.name, self.attributes(0)))
    }

    /// Session identifier from the `Cookie` request header, if any.
    #[must_use]
    pub fn extract(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(axum::http::header::COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                let val = val.trim();
                (key.trim() == self.name && !val.is_empty()).then(|| SessionId::from(val))
            })
    }
}
