//! Endpoint configuration for the Google Cloud APIs.
//!
//! One base URL per API, the bearer token sent with every request, and the
//! timeout and retry settings shared by all clients. Defaults point at the
//! production endpoints; each can be overridden from the environment to
//! target an emulator or a mock server.

use access_matrix::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryConfig;

/// Configuration for every Google Cloud API the collaborators call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Cloud Resource Manager (project IAM policy).
    pub resource_manager: ServiceEndpoint,

    /// Compute Engine (VM instances).
    pub compute: ServiceEndpoint,

    /// Kubernetes Engine (clusters).
    pub container: ServiceEndpoint,

    /// Cloud Run (managed services).
    pub run: ServiceEndpoint,

    /// Cloud Asset Inventory (IAM policy search).
    pub asset: ServiceEndpoint,

    /// OAuth2 access token sent as a bearer token.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum attempts per request, including the first.
    pub max_retries: u32,

    /// Page size requested from paged listings.
    pub page_size: u32,
}

impl Default for GcpConfig {
    /// Returns the production endpoints with no credentials.
    fn default() -> Self {
        Self {
            resource_manager: ServiceEndpoint::new("https://cloudresourcemanager.googleapis.com"),
            compute: ServiceEndpoint::new("https://compute.googleapis.com"),
            container: ServiceEndpoint::new("https://container.googleapis.com"),
            run: ServiceEndpoint::new("https://run.googleapis.com"),
            asset: ServiceEndpoint::new("https://cloudasset.googleapis.com"),
            access_token: None,
            timeout_secs: 30,
            max_retries: 3,
            page_size: 500,
        }
    }
}

impl GcpConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GCP_ACCESS_TOKEN`: bearer token for all APIs
    /// - `GCP_RESOURCE_MANAGER_URL`: default https://cloudresourcemanager.googleapis.com
    /// - `GCP_COMPUTE_URL`: default https://compute.googleapis.com
    /// - `GCP_CONTAINER_URL`: default https://container.googleapis.com
    /// - `GCP_RUN_URL`: default https://run.googleapis.com
    /// - `GCP_ASSET_URL`: default https://cloudasset.googleapis.com
    /// - `GCP_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `GCP_MAX_RETRIES`: attempts per request (default: 3)
    /// - `GCP_PAGE_SIZE`: page size for listings (default: 500)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            resource_manager: ServiceEndpoint::from_env(
                "GCP_RESOURCE_MANAGER_URL",
                default.resource_manager,
            ),
            compute: ServiceEndpoint::from_env("GCP_COMPUTE_URL", default.compute),
            container: ServiceEndpoint::from_env("GCP_CONTAINER_URL", default.container),
            run: ServiceEndpoint::from_env("GCP_RUN_URL", default.run),
            asset: ServiceEndpoint::from_env("GCP_ASSET_URL", default.asset),
            access_token: std::env::var("GCP_ACCESS_TOKEN").ok(),
            timeout_secs: std::env::var("GCP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("GCP_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            page_size: std::env::var("GCP_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.page_size),
        }
    }

    /// Point every API at one base URL. Used with emulators and mock servers.
    pub fn with_base_url(base_url: &str) -> Self {
        let endpoint = ServiceEndpoint::new(base_url);
        Self {
            resource_manager: endpoint.clone(),
            compute: endpoint.clone(),
            container: endpoint.clone(),
            run: endpoint.clone(),
            asset: endpoint,
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the retry policy for requests.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::standard().with_max_attempts(self.max_retries)
    }

    /// Require credentials before talking to the production APIs.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        match self.access_token.as_deref() {
            None | Some("") => Err(ConfigError::MissingEnvVar("GCP_ACCESS_TOKEN".to_string())),
            Some(_) if self.page_size == 0 => Err(ConfigError::InvalidValue {
                key: "GCP_PAGE_SIZE".to_string(),
                message: "must be greater than zero".to_string(),
            }),
            Some(_) => Ok(()),
        }
    }
}

/// Base URL of one API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Base URL, e.g. `https://compute.googleapis.com`.
    pub base_url: String,
}

impl ServiceEndpoint {
    /// Create an endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn from_env(var: &str, default: ServiceEndpoint) -> Self {
        std::env::var(var).map(Self::new).unwrap_or(default)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = GcpConfig::default();
        assert_eq!(config.compute.base_url, "https://compute.googleapis.com");
        assert_eq!(config.asset.base_url, "https://cloudasset.googleapis.com");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retry().max_attempts, 3);
    }

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let endpoint = ServiceEndpoint::new("http://127.0.0.1:9000/");
        assert_eq!(
            endpoint.url("/v1/projects/p:getIamPolicy"),
            "http://127.0.0.1:9000/v1/projects/p:getIamPolicy"
        );
        assert_eq!(endpoint.url("v2/x"), "http://127.0.0.1:9000/v2/x");
    }

    #[test]
    fn test_single_base_url() {
        let config = GcpConfig::with_base_url("http://localhost:8085").with_access_token("t");
        assert_eq!(config.run.url("/v2/x"), "http://localhost:8085/v2/x");
        assert_eq!(config.resource_manager, config.container);
        assert!(config.validate_for_production().is_ok());
    }

    #[test]
    fn test_production_requires_token() {
        let config = GcpConfig::default();
        assert!(matches!(
            config.validate_for_production(),
            Err(ConfigError::MissingEnvVar(var)) if var == "GCP_ACCESS_TOKEN"
        ));
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = GcpConfig::default().with_access_token("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
