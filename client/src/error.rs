//! Error types for the resource gateway

use thiserror::Error;

/// Errors that can occur when talking to the pantry service
///
/// Network failures and non-2xx responses are both failures to the UI; they
/// stay separate variants so logs can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request never produced a response (connection refused, timeout, DNS)
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with a non-2xx status
    #[error("Service error (status {status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// The operation is not offered for this resource
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl GatewayError {
    /// Whether the service rejected the request (as opposed to it never arriving)
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, GatewayError::Status { .. })
    }
}
