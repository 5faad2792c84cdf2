//! Error types for the Larder client.
//!
//! Reducers never fail: everything below ends up either as an action carrying
//! the error or as a user-visible notice. [`AppError`] is only used at the
//! process boundary (configuration, startup, the binary).

use larder_client::GatewayError;
use larder_core::environment::TokenStoreError;
use larder_runtime::StoreError;
use thiserror::Error;

/// Result type alias for startup and shell operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Client-side validation failure in an edit form.
///
/// Never reaches the gateway. Both variants surface as the same notice.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A required field is empty.
    #[error("Required field is empty")]
    Incomplete,

    /// A numeric field does not parse, or is out of range.
    #[error("Field {field} is not a valid number")]
    InvalidNumber {
        /// Name of the offending field
        field: &'static str,
    },
}

/// Why a login attempt did not produce a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The username is not an email address.
    #[error("Username is not a valid email address")]
    InvalidEmail,

    /// The password is empty.
    #[error("Password is required")]
    MissingPassword,

    /// Another attempt is still waiting for the service.
    #[error("A login attempt is already in progress")]
    InFlight,

    /// The service refused the credentials or could not be reached.
    #[error("Login rejected: {0}")]
    Rejected(GatewayError),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File that was requested
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::AppConfig`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that was requested
        path: String,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// An environment override has the wrong format.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// A setting failed validation.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error for the shell and the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Gateway construction or call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Login did not succeed.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// Durable token storage failed.
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    /// A screen's store rejected an action or timed out.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation needs a session and there is none.
    #[error("Not logged in")]
    LoggedOut,
}
