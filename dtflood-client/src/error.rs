//! Error types for the dtflood client

use thiserror::Error;

use crate::storage::presign::PresignError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to OSCAR or its object store
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

    /// Credentials were rejected or could not be obtained
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Request could not be signed
    #[error("Failed to sign request: {0}")]
    Signing(#[from] PresignError),

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
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

    /// Check if the server refused the credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
            || matches!(self, Self::ApiError { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(ClientError::api_error(404, "missing").is_not_found());
        assert!(ClientError::NotFound("svc".to_string()).is_not_found());
        assert!(!ClientError::api_error(500, "boom").is_not_found());
    }

    #[test]
    fn test_unauthorized_classification() {
        assert!(ClientError::api_error(401, "").is_unauthorized());
        assert!(ClientError::api_error(403, "").is_unauthorized());
        assert!(!ClientError::api_error(404, "").is_unauthorized());
    }
}
