//! Error types for access matrix aggregation
//!
//! Collaborator failures are [`SourceError`]. Whether one is fatal depends on
//! the stage that hit it: inventory and enrichment failures are recorded as
//! warnings, while directory and policy search failures abort the run as a
//! [`MatrixError`].

use thiserror::Error;

use crate::config::ConfigError;

/// Failure reported by an external collaborator (an API client).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("Request failed: {0}")]
    Request(String),

    /// The API answered with an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The API answered with a body that could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

/// Result type for collaborator calls.
pub type SourceResult<T> = Result<T, SourceError>;

/// Fatal aggregation errors.
///
/// Each variant names the stage that failed and keeps the collaborator error
/// as its source.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// The project principal directory could not be read.
    #[error("Failed to read principal directory for project {project}: {source}")]
    PrincipalDirectory {
        /// Project id.
        project: String,
        /// Underlying failure.
        #[source]
        source: SourceError,
    },

    /// The policy search stream could not be opened or failed mid-stream.
    #[error("Policy search failed for scope {scope}: {source}")]
    PolicySearch {
        /// Search scope, e.g. `projects/my-project`.
        scope: String,
        /// Underlying failure.
        #[source]
        source: SourceError,
    },

    /// The caller's deadline expired before the pass finished.
    #[error("Access matrix aggregation exceeded its deadline of {deadline_secs}s")]
    DeadlineExceeded {
        /// Configured deadline in seconds.
        deadline_secs: u64,
    },

    /// The aggregation was configured incorrectly.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for aggregation operations.
pub type MatrixResult<T> = Result<T, MatrixError>;

impl MatrixError {
    /// Get the stage code for API responses.
    pub fn stage(&self) -> &'static str {
        match self {
            MatrixError::PrincipalDirectory { .. } => "PRINCIPAL_DIRECTORY",
            MatrixError::PolicySearch { .. } => "POLICY_SEARCH",
            MatrixError::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
            MatrixError::Config(_) => "CONFIG",
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            MatrixError::PrincipalDirectory { source, .. }
            | MatrixError::PolicySearch { source, .. } => match source {
                SourceError::AuthenticationFailed => 401,
                SourceError::Api { status: 403, .. } => 403,
                _ => 502,
            },
            MatrixError::DeadlineExceeded { .. } => 504,
            MatrixError::Config(_) => 500,
        }
    }
}
