//! Google Cloud API clients.
//!
//! Each client wraps one API and implements the collaborator trait the
//! aggregation core reads through:
//! - Resource Manager: [`PrincipalDirectory`](access_matrix::PrincipalDirectory)
//! - Cloud Asset: [`PolicySearch`](access_matrix::PolicySearch)
//! - Kubernetes Engine, Compute Engine, Cloud Run: [`InventorySource`](access_matrix::InventorySource)
//! - Compute Engine + Cloud Run together: [`PolicyGetter`](access_matrix::PolicyGetter)

pub mod asset;
pub mod compute;
pub mod container;
pub mod policies;
pub mod resource_manager;
pub mod run;

pub use asset::AssetClient;
pub use compute::ComputeClient;
pub use container::ContainerClient;
pub use policies::GcpPolicyGetter;
pub use resource_manager::ResourceManagerClient;
pub use run::RunClient;

use access_matrix::{AccessMatrixService, Binding, MatrixConfig, MatrixResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::GcpConfig;
use crate::error::GcpResult;
use crate::http::GcpHttp;

/// An IAM policy as returned by `getIamPolicy`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IamPolicy {
    /// Role bindings.
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl IamPolicy {
    /// Every member bound in the policy, in first-seen order, without
    /// duplicates.
    pub fn members(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.bindings
            .iter()
            .flat_map(|binding| binding.members.iter())
            .filter(|member| seen.insert(member.as_str()))
            .cloned()
            .collect()
    }
}

/// All clients needed to aggregate one project.
#[derive(Debug, Clone)]
pub struct GcpClients {
    /// Project IAM policy.
    pub resource_manager: ResourceManagerClient,
    /// Project-wide policy search.
    pub asset: AssetClient,
    /// Kubernetes clusters.
    pub container: ContainerClient,
    /// VM instances.
    pub compute: ComputeClient,
    /// Managed services.
    pub run: RunClient,
}

impl GcpClients {
    /// Create clients for the project and zones named in `matrix`.
    pub fn new(config: &GcpConfig, matrix: &MatrixConfig) -> GcpResult<Self> {
        let http = GcpHttp::new(config)?;
        let project = matrix.project_id.as_str();

        Ok(Self {
            resource_manager: ResourceManagerClient::new(http.clone(), config.resource_manager.clone()),
            asset: AssetClient::new(http.clone(), config.asset.clone()),
            container: ContainerClient::new(http.clone(), config.container.clone(), project),
            compute: ComputeClient::new(
                http.clone(),
                config.compute.clone(),
                project,
                matrix.zones.clone(),
            ),
            run: RunClient::new(http, config.run.clone(), project),
        })
    }

    /// Wire the clients into an aggregation service.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use access_gcp::{GcpClients, GcpConfig};
    /// use access_matrix::MatrixConfig;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let matrix = MatrixConfig::from_env()?;
    /// let clients = GcpClients::new(&GcpConfig::from_env(), &matrix)?;
    /// let service = clients.access_matrix_service(matrix)?;
    /// let result = service.compute_access_matrix().await?;
    /// println!("{} entries", result.access.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn access_matrix_service(&self, matrix: MatrixConfig) -> MatrixResult<AccessMatrixService> {
        let service = AccessMatrixService::new(
            matrix,
            Arc::new(self.resource_manager.clone()),
            Arc::new(self.asset.clone()),
        )?;

        Ok(service
            .with_inventory(Arc::new(self.container.clone()))
            .with_inventory(Arc::new(self.compute.clone()))
            .with_inventory(Arc::new(self.run.clone()))
            .with_policy_getter(Arc::new(GcpPolicyGetter::new(
                self.compute.clone(),
                self.run.clone(),
            ))))
    }
}
