//! Kubernetes Engine client.
//!
//! Cluster listings are not paged; the `-` location lists every region and
//! zone at once.

use access_matrix::{
    ClusterRecord, Cursor, InventoryRecord, InventorySource, SourceResult, VecCursor,
};
use access_model::ResourceKind;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::ServiceEndpoint;
use crate::error::GcpResult;
use crate::http::GcpHttp;

/// Kubernetes Engine client for one project.
#[derive(Debug, Clone)]
pub struct ContainerClient {
    http: GcpHttp,
    endpoint: ServiceEndpoint,
    project_id: String,
}

impl ContainerClient {
    /// Create a new Kubernetes Engine client.
    pub fn new(http: GcpHttp, endpoint: ServiceEndpoint, project_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            project_id: project_id.into(),
        }
    }

    /// List the clusters in `location` (`-` for all).
    #[instrument(skip(self))]
    pub async fn list_clusters(&self, location: &str) -> GcpResult<Vec<ClusterRecord>> {
        let url = self.endpoint.url(&format!(
            "/v1/projects/{}/locations/{}/clusters",
            self.project_id, location
        ));
        let response: ClusterList = self.http.get_json(&url, &[]).await?;

        if !response.missing_zones.is_empty() {
            warn!(zones = ?response.missing_zones, "Cluster listing is missing zones");
        }
        debug!(clusters = response.clusters.len(), "Clusters listed");

        Ok(response
            .clusters
            .into_iter()
            .map(|cluster| ClusterRecord {
                name: cluster.name,
                self_link: cluster.self_link,
                location: cluster.location,
            })
            .collect())
    }
}

#[async_trait]
impl InventorySource for ContainerClient {
    fn backend(&self) -> &str {
        "container"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Cluster
    }

    async fn list(&self, location: &str) -> SourceResult<Box<dyn Cursor<InventoryRecord>>> {
        let clusters = self.list_clusters(location).await?;
        Ok(Box::new(VecCursor::new(
            clusters.into_iter().map(InventoryRecord::Cluster).collect(),
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterList {
    #[serde(default)]
    clusters: Vec<Cluster>,
    #[serde(default)]
    missing_zones: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cluster {
    name: String,
    #[serde(default)]
    self_link: String,
    #[serde(default)]
    location: String,
}
