//! Compute Engine client.
//!
//! VM instances are listed per zone; each zone is one inventory partition.
//! Instance ids are 64-bit integers the API encodes as JSON strings.

use access_matrix::{Binding, Cursor, InstanceRecord, InventoryRecord, InventorySource, SourceResult};
use access_model::ResourceKind;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::IamPolicy;
use crate::config::ServiceEndpoint;
use crate::error::{GcpError, GcpResult};
use crate::http::{GcpHttp, Page, PageCursor};

/// Compute Engine client for one project.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    http: GcpHttp,
    endpoint: ServiceEndpoint,
    project_id: String,
    zones: Vec<String>,
}

impl ComputeClient {
    /// Create a new Compute Engine client listing `zones`.
    pub fn new(
        http: GcpHttp,
        endpoint: ServiceEndpoint,
        project_id: impl Into<String>,
        zones: Vec<String>,
    ) -> Self {
        Self {
            http,
            endpoint,
            project_id: project_id.into(),
            zones,
        }
    }

    /// Open a lazy listing of the instances in `zone`.
    #[instrument(skip(self))]
    pub fn list_instances(&self, zone: &str) -> PageCursor<InstancePage> {
        let url = self.endpoint.url(&format!(
            "/compute/v1/projects/{}/zones/{}/instances",
            self.project_id, zone
        ));
        PageCursor::new(self.http.clone(), url).with_query("maxResults", self.http.page_size())
    }

    /// Get an instance's IAM policy.
    #[instrument(skip(self))]
    pub async fn get_instance_iam_policy(&self, zone: &str, instance: &str) -> GcpResult<IamPolicy> {
        let url = self.endpoint.url(&format!(
            "/compute/v1/projects/{}/zones/{}/instances/{}/getIamPolicy",
            self.project_id, zone, instance
        ));
        self.http.get_json(&url, &[]).await
    }

    /// Get the bindings attached to an instance.
    pub async fn instance_bindings(&self, zone: &str, instance: &str) -> GcpResult<Vec<Binding>> {
        Ok(self.get_instance_iam_policy(zone, instance).await?.bindings)
    }
}

#[async_trait]
impl InventorySource for ComputeClient {
    fn backend(&self) -> &str {
        "compute"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Vm
    }

    async fn partitions(&self) -> SourceResult<Vec<String>> {
        Ok(self.zones.clone())
    }

    async fn list(&self, zone: &str) -> SourceResult<Box<dyn Cursor<InventoryRecord>>> {
        Ok(Box::new(self.list_instances(zone)))
    }
}

/// One page of `instances.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePage {
    #[serde(default)]
    items: Vec<Instance>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    id: String,
    name: String,
    #[serde(default)]
    zone: String,
    #[serde(default)]
    self_link: String,
}

impl Instance {
    fn into_record(self) -> GcpResult<InstanceRecord> {
        let id = self.id.parse::<u64>().map_err(|_| {
            GcpError::InvalidResponse(format!(
                "instance {} has non-numeric id {:?}",
                self.name, self.id
            ))
        })?;

        Ok(InstanceRecord {
            id,
            name: self.name,
            zone: self.zone,
            self_link: self.self_link,
        })
    }
}

impl Page for InstancePage {
    type Item = InventoryRecord;

    fn into_parts(self) -> GcpResult<(Vec<InventoryRecord>, Option<String>)> {
        let records = self
            .items
            .into_iter()
            .map(|instance| instance.into_record().map(InventoryRecord::Instance))
            .collect::<GcpResult<Vec<_>>>()?;
        Ok((records, self.next_page_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_page_decodes_string_ids() {
        let page: InstancePage = serde_json::from_value(serde_json::json!({
            "kind": "compute#instanceList",
            "items": [{
                "id": "4419816502436283473",
                "name": "vm-1",
                "zone": "https://www.googleapis.com/compute/v1/projects/p/zones/us-east1-b",
                "selfLink": "https://www.googleapis.com/compute/v1/projects/p/zones/us-east1-b/instances/vm-1",
                "status": "RUNNING"
            }]
        }))
        .unwrap();

        let (records, token) = page.into_parts().unwrap();
        assert!(token.is_none());
        match &records[0] {
            InventoryRecord::Instance(instance) => {
                assert_eq!(instance.id, 4419816502436283473);
                assert_eq!(instance.name, "vm-1");
            }
            other => panic!("unexpected record: {other:?}"),
        }
        assert_eq!(records[0].location(), Some("us-east1-b"));
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let page: InstancePage = serde_json::from_value(serde_json::json!({
            "items": [{ "id": "abc", "name": "vm-1" }]
        }))
        .unwrap();

        assert!(matches!(page.into_parts(), Err(GcpError::InvalidResponse(_))));
    }
}
