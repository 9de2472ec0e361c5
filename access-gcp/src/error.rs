//! Google Cloud client errors.

use access_matrix::SourceError;
use thiserror::Error;

/// Google Cloud client errors.
#[derive(Debug, Error)]
pub enum GcpError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error body from the API.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The requested resource does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The access token was rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

/// Result type for Google Cloud calls.
pub type GcpResult<T> = Result<T, GcpError>;

impl GcpError {
    /// Whether another attempt may succeed: transport failures, throttling
    /// and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            GcpError::RequestFailed(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GcpError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<GcpError> for SourceError {
    fn from(err: GcpError) -> Self {
        match err {
            GcpError::RequestFailed(e) => SourceError::Request(e.to_string()),
            GcpError::ApiError { status, message } => SourceError::Api { status, message },
            GcpError::InvalidResponse(message) => SourceError::InvalidResponse(message),
            GcpError::NotFound(what) => SourceError::NotFound(what),
            GcpError::AuthenticationFailed => SourceError::AuthenticationFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> GcpError {
        GcpError::ApiError {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_transient_statuses() {
        assert!(api(429).is_transient());
        assert!(api(500).is_transient());
        assert!(api(503).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(403).is_transient());
        assert!(!GcpError::AuthenticationFailed.is_transient());
        assert!(!GcpError::InvalidResponse("x".to_string()).is_transient());
    }

    #[test]
    fn test_converts_to_source_error() {
        let source: SourceError = api(403).into();
        assert!(matches!(source, SourceError::Api { status: 403, .. }));

        let source: SourceError = GcpError::NotFound("projects/p".to_string()).into();
        assert_eq!(source.to_string(), "Not found: projects/p");

        let source: SourceError = GcpError::AuthenticationFailed.into();
        assert!(matches!(source, SourceError::AuthenticationFailed));
    }
}
