//! Cloud Run client (Admin API v2).

use access_matrix::{Cursor, InventoryRecord, InventorySource, ServiceRecord, SourceResult};
use access_model::ResourceKind;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::IamPolicy;
use crate::config::ServiceEndpoint;
use crate::error::GcpResult;
use crate::http::{GcpHttp, Page, PageCursor};

/// Cloud Run client for one project.
#[derive(Debug, Clone)]
pub struct RunClient {
    http: GcpHttp,
    endpoint: ServiceEndpoint,
    project_id: String,
}

impl RunClient {
    /// Create a new Cloud Run client.
    pub fn new(http: GcpHttp, endpoint: ServiceEndpoint, project_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            project_id: project_id.into(),
        }
    }

    /// Open a lazy listing of the services in `location` (`-` for all).
    #[instrument(skip(self))]
    pub fn list_services(&self, location: &str) -> PageCursor<ServicePage> {
        let url = self.endpoint.url(&format!(
            "/v2/projects/{}/locations/{}/services",
            self.project_id, location
        ));
        PageCursor::new(self.http.clone(), url).with_query("pageSize", self.http.page_size())
    }

    /// Get a service's IAM policy by its full name
    /// (`projects/P/locations/L/services/S`).
    #[instrument(skip(self))]
    pub async fn get_service_iam_policy(&self, name: &str) -> GcpResult<IamPolicy> {
        let url = self.endpoint.url(&format!("/v2/{}:getIamPolicy", name));
        self.http.get_json(&url, &[]).await
    }
}

#[async_trait]
impl InventorySource for RunClient {
    fn backend(&self) -> &str {
        "run"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::ManagedService
    }

    async fn list(&self, location: &str) -> SourceResult<Box<dyn Cursor<InventoryRecord>>> {
        Ok(Box::new(self.list_services(location)))
    }
}

/// One page of `services.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePage {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Service {
    name: String,
    #[serde(default)]
    uri: Option<String>,
}

impl Page for ServicePage {
    type Item = InventoryRecord;

    fn into_parts(self) -> GcpResult<(Vec<InventoryRecord>, Option<String>)> {
        let records = self
            .services
            .into_iter()
            .map(|service| {
                InventoryRecord::Service(ServiceRecord {
                    name: service.name,
                    uri: service.uri.filter(|uri| !uri.is_empty()),
                })
            })
            .collect();
        Ok((records, self.next_page_token))
    }
}
