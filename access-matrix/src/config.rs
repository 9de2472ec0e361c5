//! Aggregation configuration.
//!
//! Names the project to aggregate, the VM zone set, and an optional deadline
//! for the whole pass. Configuration is loaded from environment variables with
//! defaults matching the zones most projects start in.

use access_model::{CanonicalKey, ResourceKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Zones listed for VMs when none are configured.
pub const DEFAULT_ZONES: &[&str] = &[
    "us-central1-a",
    "us-central1-b",
    "us-east1-b",
    "us-west1-a",
    "europe-west1-b",
];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for one project's access matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Project id whose IAM data is aggregated.
    pub project_id: String,

    /// Zones the VM backend lists.
    pub zones: Vec<String>,

    /// Deadline for one aggregation pass, in seconds.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl MatrixConfig {
    /// Create a configuration for `project_id` with the default zones.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            zones: DEFAULT_ZONES.iter().map(|z| z.to_string()).collect(),
            deadline_secs: None,
        }
    }

    /// Replace the zone set.
    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
        self
    }

    /// Set the deadline for one pass.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_secs = Some(deadline.as_secs());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GCP_PROJECT_ID`: Project to aggregate (required)
    /// - `GCP_ZONES`: Comma-separated VM zones (default: five common zones)
    /// - `ACCESS_MATRIX_DEADLINE_SECS`: Deadline for one pass (default: none)
    pub fn from_env() -> ConfigResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GCP_PROJECT_ID".to_string()))?;

        let mut config = Self::new(project_id.trim());

        if let Ok(zones) = std::env::var("GCP_ZONES") {
            config.zones = parse_list(&zones);
        }

        if let Ok(raw) = std::env::var("ACCESS_MATRIX_DEADLINE_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "ACCESS_MATRIX_DEADLINE_SECS".to_string(),
                message: e.to_string(),
            })?;
            config.deadline_secs = Some(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "project_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.zones.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "zones".to_string(),
                message: "at least one zone is required".to_string(),
            });
        }
        if self.deadline_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "deadline_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the deadline as a Duration.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Get the policy search scope, `projects/<id>`.
    pub fn search_scope(&self) -> String {
        format!("projects/{}", self.project_id)
    }

    /// Get the full resource name of the project.
    pub fn project_resource_name(&self) -> String {
        format!(
            "//cloudresourcemanager.googleapis.com/projects/{}",
            self.project_id
        )
    }

    /// Get the canonical key of the project itself.
    pub fn project_key(&self) -> CanonicalKey {
        CanonicalKey::new(ResourceKind::Project, self.project_id.clone())
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
