//! Application configuration.
//!
//! Settings come from an optional TOML file named by `LARDER_CONFIG`, then
//! individual environment overrides, then validation.
//!
//! ```toml
//! [api]
//! base_url = "https://pantry.example.com/"
//! timeout_secs = 10
//!
//! [storage]
//! token_path = "/home/cook/.local/share/larder/token.json"
//! token_key = "secure_token"
//!
//! [ui]
//! notice_ttl_ms = 2000
//! ```

use crate::error::ConfigError;
use larder_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Variable naming the TOML config file.
pub const CONFIG_ENV: &str = "LARDER_CONFIG";
/// Override for [`ClientConfig::base_url`].
pub const API_URL_ENV: &str = "LARDER_API_URL";
/// Override for [`StorageConfig::token_path`].
pub const TOKEN_PATH_ENV: &str = "LARDER_TOKEN_PATH";
/// Override for [`UiConfig::notice_ttl_ms`].
pub const NOTICE_TTL_ENV: &str = "LARDER_NOTICE_TTL_MS";

/// Where the session token is kept between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the token store
    pub token_path: PathBuf,
    /// Key the token is stored under
    pub token_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("larder-token.json"),
            token_key: "secure_token".to_string(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long transient notices stay visible, in milliseconds
    pub notice_ttl_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { notice_ttl_ms: 2000 }
    }
}

impl UiConfig {
    /// Notice lifetime
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pantry service connection
    pub api: ClientConfig,
    /// Durable token storage
    pub storage: StorageConfig,
    /// Presentation
    pub ui: UiConfig,
}

impl AppConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid.
    pub fn from_toml(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an
    /// override is malformed, or validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                Self::from_toml(&raw, &path)?
            },
            None => Self::default(),
        };

        if let Some(url) = lookup(API_URL_ENV) {
            config.api.base_url = url;
        }
        if let Some(path) = lookup(TOKEN_PATH_ENV) {
            config.storage.token_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(NOTICE_TTL_ENV) {
            config.ui.notice_ttl_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: NOTICE_TTL_ENV,
                value: raw.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise fail later and less clearly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".to_string()));
        }
        if self.storage.token_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.token_key must not be empty".to_string()));
        }
        if self.ui.notice_ttl_ms == 0 {
            return Err(ConfigError::Invalid("ui.notice_ttl_ms must be positive".to_string()));
        }
        Ok(())
    }
}
