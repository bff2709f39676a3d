//! Client configuration.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for a [`ShelfClient`](crate::ShelfClient).
///
/// Deserializable so front ends can load it from a config file; every field
/// except `url` has a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Origin of the backend (e.g. "http://localhost:5000")
    pub url: String,

    /// Path prefix for every endpoint
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Per-request timeout in milliseconds unless a call overrides it
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Refresh the access token once on 401
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,

    /// How long a request waits for someone else's refresh
    #[serde(default = "default_refresh_wait_ms")]
    pub refresh_wait_ms: u64,

    /// Poll interval while waiting for someone else's refresh
    #[serde(default = "default_refresh_poll_ms")]
    pub refresh_poll_ms: u64,

    #[serde(default)]
    pub capabilities: Capabilities,
}

/// Optional backend endpoints.
///
/// Not every deployment exposes them, so they are opted into once at
/// startup instead of being probed per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Capabilities {
    /// `GET admin/pool-status`
    #[serde(default)]
    pub pool_status: bool,

    /// `POST admin/reset-pool`
    #[serde(default)]
    pub pool_reset: bool,
}

impl ClientConfig {
    /// Create a config for the given origin with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            base_path: default_base_path(),
            default_timeout_ms: default_timeout_ms(),
            auto_refresh: default_auto_refresh(),
            refresh_wait_ms: default_refresh_wait_ms(),
            refresh_poll_ms: default_refresh_poll_ms(),
            capabilities: Capabilities::default(),
        }
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.auto_refresh = enabled;
        self
    }

    /// Bound and poll interval for waiting on a refresh already in flight.
    #[must_use]
    pub fn with_refresh_wait(mut self, wait: Duration, poll: Duration) -> Self {
        self.refresh_wait_ms = wait.as_millis() as u64;
        self.refresh_poll_ms = poll.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn refresh_wait(&self) -> Duration {
        Duration::from_millis(self.refresh_wait_ms)
    }

    pub fn refresh_poll(&self) -> Duration {
        Duration::from_millis(self.refresh_poll_ms.max(1))
    }

    /// Validate and join origin and base path into the API root.
    ///
    /// Trailing slashes are dropped from both parts.
    pub fn api_root(&self) -> Result<String> {
        if self.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let origin = self.url.trim_end_matches('/');
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let base = self.base_path.trim_matches('/');
        if base.is_empty() {
            Ok(origin.to_string())
        } else {
            Ok(format!("{}/{}", origin, base))
        }
    }
}

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_auto_refresh() -> bool {
    true
}

fn default_refresh_wait_ms() -> u64 {
    3_000
}

fn default_refresh_poll_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:5000");
        assert_eq!(config.base_path, "/api");
        assert_eq!(config.default_timeout(), Duration::from_secs(15));
        assert!(config.auto_refresh);
        assert_eq!(config.refresh_wait(), Duration::from_secs(3));
        assert_eq!(config.refresh_poll(), Duration::from_millis(100));
        assert_eq!(config.capabilities, Capabilities::default());
    }

    #[test]
    fn test_api_root() {
        let root = ClientConfig::new("https://library.example.com/").api_root();
        assert_eq!(root.unwrap(), "https://library.example.com/api");

        let root = ClientConfig::new("http://localhost:5000///")
            .with_base_path("/v2/api/")
            .api_root();
        assert_eq!(root.unwrap(), "http://localhost:5000/v2/api");

        let root = ClientConfig::new("http://localhost:5000")
            .with_base_path("")
            .api_root();
        assert_eq!(root.unwrap(), "http://localhost:5000");
    }

    #[test]
    fn test_invalid_urls() {
        for url in ["", "library.example.com", "ftp://example.com"] {
            let result = ClientConfig::new(url).api_root();
            assert!(matches!(result, Err(ClientError::InvalidUrl(_))), "{url}");
        }
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "url": "http://localhost:5000",
            "capabilities": { "pool_reset": true }
        }))
        .unwrap();

        assert_eq!(config.default_timeout_ms, 15_000);
        assert!(config.capabilities.pool_reset);
        assert!(!config.capabilities.pool_status);
    }
}
