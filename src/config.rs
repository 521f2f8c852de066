//! Client configuration.
//!
//! The HTTP origin is supplied externally; the WebSocket origin is derived
//! from it by substituting the scheme.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable holding the HTTP origin.
pub const API_URL_ENV: &str = "KOINE_API_URL";

/// Deadline applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration shared by the request client and the chat channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// HTTP origin of the study service, e.g. `http://localhost:8000`.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry behaviour for retryable statuses.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Creates a configuration pointing at [`DEFAULT_API_URL`].
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Reads the origin from `KOINE_API_URL`, falling back to the default.
    pub fn from_env() -> Result<Self> {
        match env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new().with_api_url(url.trim()),
            _ => Ok(Self::new()),
        }
    }

    /// Sets the HTTP origin.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        let url = Url::parse(api_url)?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::validation(
                    format!("unsupported scheme {scheme:?} for the API origin"),
                    Some("api_url".to_string()),
                ));
            }
        }
        self.api_url = url.to_string();
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The origin as a URL whose path ends in `/`.
    fn origin(&self) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// The base every REST path is resolved against: `<origin>/api/`.
    pub fn api_base(&self) -> Result<Url> {
        Ok(self.origin()?.join("api/")?)
    }

    /// Resolves `path` against the WebSocket form of the origin.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`.
    pub fn websocket_url(&self, path: &str) -> Result<Url> {
        let origin = self.origin()?;
        let rewritten = match origin.scheme() {
            "ws" | "wss" => origin.to_string(),
            "http" | "https" => format!("ws{}", &origin.as_str()["http".len()..]),
            _ => {
                return Err(Error::validation(
                    format!("cannot derive a WebSocket origin from {origin}"),
                    Some("api_url".to_string()),
                ));
            }
        };
        let base = Url::parse(&rewritten)?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
