//! Error types shared across Stratus

use thiserror::Error;

/// Failure reported by a remote API collaborator.
///
/// Absence of a resource is NOT an error: get/list operations return
/// `Ok(None)` / empty collections for 404-style responses.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication or authorization rejected by the remote side
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Remote side rejected or failed the request
    #[error("remote API error during {operation}: {message}")]
    Remote {
        /// Operation attempted, e.g. `deployment create`
        operation: String,
        /// Remote-reported detail
        message: String,
    },

    /// Request or response body could not be (de)serialized
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Transport-level failure (connection reset, DNS, ...)
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Remote rejection with the operation attempted
    pub fn remote(operation: &str, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for remote API calls
pub type ApiResult<T> = Result<T, ApiError>;
