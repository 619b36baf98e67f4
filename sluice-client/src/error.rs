//! Error types for the Sluice client

use sluice_core::BackendError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the control-plane client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The base URL cannot address API paths
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(what) => BackendError::NotFound(what),
            ClientError::ApiError { status: 404, message } => BackendError::NotFound(message),
            ClientError::ApiError { status, message } => BackendError::Api { status, message },
            ClientError::ParseError(message) => BackendError::Decode(message),
            ClientError::InvalidUrl(message) => BackendError::InvalidRequest(message),
            ClientError::RequestFailed(err) if err.is_decode() => BackendError::Decode(err.to_string()),
            ClientError::RequestFailed(err) => BackendError::Transport(err.to_string()),
        }
    }
}
