//! Connection settings for the pantry service

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the pantry service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:8000/`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with the default timeout
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Base URL with exactly one trailing slash, ready for relative paths
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim().trim_end_matches('/'))
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_single_trailing_slash() {
        assert_eq!(
            ClientConfig::with_base_url("http://pantry.local:8000").normalized_base_url(),
            "http://pantry.local:8000/"
        );
        assert_eq!(
            ClientConfig::with_base_url("http://pantry.local//").normalized_base_url(),
            "http://pantry.local/"
        );
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.base_url.ends_with('/'));
    }
}
