//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Name of the cookie that carries the service session.
pub const SESSION_COOKIE: &str = "session";

/// Where the triage service lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:8000/`.
    pub base_url: Url,
    /// Per-request timeout. `None` uses the transport default.
    pub timeout: Option<Duration>,
    /// Value of the session cookie to send with every request.
    pub session_cookie: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "unsupported scheme '{}', expected http or https",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
            return Err(Error::InvalidConfig(format!(
                "'{base_url}' cannot be used as a service root"
            )));
        }

        Ok(Self {
            base_url,
            timeout: None,
            session_cookie: None,
        })
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the session cookie value.
    ///
    /// Accepts either the bare value or `session=<value>`.
    #[must_use]
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        let prefix = format!("{SESSION_COOKIE}=");
        let value = cookie.strip_prefix(&prefix).unwrap_or(&cookie).trim();
        self.session_cookie = (!value.is_empty()).then(|| value.to_string());
        self
    }

    /// Host name of the service, used to key stored credentials.
    #[must_use]
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// Builds the URL for a path below the service root.
    ///
    /// Each segment is percent-encoded on its own, so ids containing `/`
    /// stay a single segment.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Where users are sent to sign in.
    #[must_use]
    pub fn login_url(&self) -> Url {
        self.endpoint(&["authorize"])
    }
}
