//! Cloud Resource Manager client.
//!
//! Reads the project's own IAM policy, which is the principal directory for
//! the aggregation.

use access_matrix::{PrincipalDirectory, SourceResult};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};

use super::IamPolicy;
use crate::config::ServiceEndpoint;
use crate::error::GcpResult;
use crate::http::GcpHttp;

/// Cloud Resource Manager client.
#[derive(Debug, Clone)]
pub struct ResourceManagerClient {
    http: GcpHttp,
    endpoint: ServiceEndpoint,
}

impl ResourceManagerClient {
    /// Create a new Resource Manager client.
    pub fn new(http: GcpHttp, endpoint: ServiceEndpoint) -> Self {
        Self { http, endpoint }
    }

    /// Get a project's IAM policy.
    #[instrument(skip(self))]
    pub async fn get_iam_policy(&self, project_id: &str) -> GcpResult<IamPolicy> {
        let url = self
            .endpoint
            .url(&format!("/v1/projects/{}:getIamPolicy", project_id));
        let body = json!({ "options": { "requestedPolicyVersion": 3 } });

        self.http.post_json(&url, &body).await
    }
}

#[async_trait]
impl PrincipalDirectory for ResourceManagerClient {
    async fn list_members(&self, project_id: &str) -> SourceResult<Vec<String>> {
        let policy = self.get_iam_policy(project_id).await?;
        let members = policy.members();
        debug!(
            project = %project_id,
            bindings = policy.bindings.len(),
            members = members.len(),
            "Project IAM policy read"
        );
        Ok(members)
    }
}
