//! Per-resource IAM policy lookup.

use access_matrix::{Binding, InventoryRecord, PolicyGetter, SourceResult};
use access_model::trailing_name;
use async_trait::async_trait;

use super::{ComputeClient, RunClient};

/// Routes each inventory record to the API that owns its IAM policy.
///
/// Kubernetes clusters have no resource-level IAM policy; their access is
/// granted at the project level, so they report no bindings.
#[derive(Debug, Clone)]
pub struct GcpPolicyGetter {
    compute: ComputeClient,
    run: RunClient,
}

impl GcpPolicyGetter {
    /// Create a policy getter.
    pub fn new(compute: ComputeClient, run: RunClient) -> Self {
        Self { compute, run }
    }
}

#[async_trait]
impl PolicyGetter for GcpPolicyGetter {
    async fn get_policy(&self, record: &InventoryRecord) -> SourceResult<Vec<Binding>> {
        let bindings = match record {
            InventoryRecord::Cluster(_) => Vec::new(),
            InventoryRecord::Instance(instance) => {
                self.compute
                    .instance_bindings(trailing_name(&instance.zone), &instance.name)
                    .await?
            }
            InventoryRecord::Service(service) => {
                self.run.get_service_iam_policy(&service.name).await?.bindings
            }
        };
        Ok(bindings)
    }
}
