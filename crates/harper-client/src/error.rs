//! Error types for remote administration calls.

use thiserror::Error;

use crate::config::ConfigError;

/// Remote administration errors.
///
/// `Conflict` and `NotFound` are split out of the generic API error so that
/// reconcilers can apply their create and delete policies.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The object already exists.
    #[error("Already exists: {0}")]
    Conflict(String),

    /// The object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The request cannot be expressed in the operations API.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Client configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for remote administration calls.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Whether the error reports an object that already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict(_))
    }

    /// Whether the error reports an object that is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Classify a non-success response.
    ///
    /// 409 and "already exists" messages are conflicts; 404, "does not exist"
    /// and "not found" messages are not-found. Anything else is an API error.
    pub fn from_status(status: u16, message: String) -> Self {
        let lower = message.to_lowercase();
        if status == 401 || status == 403 {
            ClientError::AuthenticationFailed
        } else if status == 409 || lower.contains("already exists") {
            ClientError::Conflict(message)
        } else if status == 404 || lower.contains("does not exist") || lower.contains("not found") {
            ClientError::NotFound(message)
        } else {
            ClientError::ApiError { status, message }
        }
    }
}
