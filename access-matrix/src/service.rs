//! Access matrix service
//!
//! Runs one aggregation pass over the configured collaborators:
//!
//! ```text
//! PrincipalDirectory ──► PrincipalSet ─┐
//! InventorySource* ──► ResourceNormalizer ──► ResourceSet ─┤
//!                                                          ▼
//! PolicySearch ──► PolicyStreamReducer ──► FactSet (direct)
//!                                                          ▼
//!                     InheritanceResolver ──► FactSet (direct ∪ inherited)
//!                                                          ▼
//!                                 MatrixAssembler ──► AccessMatrix
//! ```
//!
//! Stages run in order; each hands its owned output to the next.

use access_model::Principal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::assembler::{AccessMatrix, MatrixAssembler};
use crate::config::MatrixConfig;
use crate::error::{MatrixError, MatrixResult};
use crate::inheritance::InheritanceResolver;
use crate::inventory::{InventoryCollection, ResourceNormalizer};
use crate::policy::PolicyStreamReducer;
use crate::principals::PrincipalSet;
use crate::resources::Resource;
use crate::sources::{InventorySource, PolicyGetter, PolicySearch, PrincipalDirectory};

/// Aggregates a project's IAM data into an [`AccessMatrix`].
///
/// # Example
///
/// ```rust,no_run
/// use access_matrix::{AccessMatrixService, MatrixConfig};
/// # use access_matrix::sources::{PolicySearch, PrincipalDirectory};
/// # use std::sync::Arc;
///
/// # async fn example(
/// #     directory: Arc<dyn PrincipalDirectory>,
/// #     search: Arc<dyn PolicySearch>,
/// # ) -> Result<(), access_matrix::MatrixError> {
/// let service = AccessMatrixService::new(MatrixConfig::new("my-project"), directory, search)?;
/// let matrix = service.compute_access_matrix().await?;
/// println!("{} entries", matrix.access.len());
/// # Ok(())
/// # }
/// ```
pub struct AccessMatrixService {
    config: MatrixConfig,
    directory: Arc<dyn PrincipalDirectory>,
    search: Arc<dyn PolicySearch>,
    inventory: Vec<Arc<dyn InventorySource>>,
    policies: Option<Arc<dyn PolicyGetter>>,
}

impl std::fmt::Debug for AccessMatrixService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessMatrixService")
            .field("config", &self.config)
            .field("inventory_backends", &self.inventory.len())
            .field("enrichment", &self.policies.is_some())
            .finish()
    }
}

impl AccessMatrixService {
    /// Create a service with the two required sources of access facts.
    pub fn new(
        config: MatrixConfig,
        directory: Arc<dyn PrincipalDirectory>,
        search: Arc<dyn PolicySearch>,
    ) -> MatrixResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            directory,
            search,
            inventory: Vec::new(),
            policies: None,
        })
    }

    /// Add an inventory backend.
    pub fn with_inventory(mut self, source: Arc<dyn InventorySource>) -> Self {
        self.inventory.push(source);
        self
    }

    /// Enrich inventory resources with their own IAM policies.
    pub fn with_policy_getter(mut self, policies: Arc<dyn PolicyGetter>) -> Self {
        self.policies = Some(policies);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Compute the access matrix.
    ///
    /// Fails only when the principal directory or the policy search stream
    /// fails, or when the configured deadline expires. Inventory failures are
    /// reported in [`AccessMatrix::warnings`].
    pub async fn compute_access_matrix(&self) -> MatrixResult<AccessMatrix> {
        let run_id = Uuid::now_v7();
        let span = info_span!("access_matrix", project = %self.config.project_id, run_id = %run_id);

        let pass = self.run(run_id).instrument(span);
        match self.config.deadline() {
            Some(deadline) => tokio::time::timeout(deadline, pass).await.map_err(|_| {
                MatrixError::DeadlineExceeded {
                    deadline_secs: deadline.as_secs(),
                }
            })?,
            None => pass.await,
        }
    }

    /// List the principals in the project directory.
    pub async fn list_principals(&self) -> MatrixResult<Vec<Principal>> {
        Ok(self.read_directory().await?.into_vec())
    }

    /// List the inventory resources, with best-effort enrichment.
    pub async fn list_resources(&self) -> Vec<Resource> {
        self.collect_inventory().await.resources.into_vec()
    }

    async fn run(&self, run_id: Uuid) -> MatrixResult<AccessMatrix> {
        let started = Instant::now();

        let principals = self.read_directory().await?;
        info!(principals = principals.len(), "Principal directory read");

        let InventoryCollection {
            resources,
            warnings,
        } = self.collect_inventory().await;

        let scope = self.config.search_scope();
        let policy_error = |source| MatrixError::PolicySearch {
            scope: scope.clone(),
            source,
        };
        let mut cursor = self.search.search_all(&scope).await.map_err(policy_error)?;
        let mut state = PolicyStreamReducer::new(resources, principals)
            .consume(cursor.as_mut())
            .await
            .map_err(policy_error)?;

        InheritanceResolver::new(self.config.project_key()).apply(&mut state.facts, &state.resources);

        let matrix = MatrixAssembler::new(self.config.project_id.clone(), run_id).assemble(
            state.principals,
            state.resources,
            &state.facts,
            warnings,
        );

        info!(
            principals = matrix.principals.len(),
            resources = matrix.resources.len(),
            entries = matrix.access.len(),
            warnings = matrix.warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Access matrix computed"
        );
        Ok(matrix)
    }

    async fn read_directory(&self) -> MatrixResult<PrincipalSet> {
        let members = self
            .directory
            .list_members(&self.config.project_id)
            .await
            .map_err(|source| MatrixError::PrincipalDirectory {
                project: self.config.project_id.clone(),
                source,
            })?;
        Ok(PrincipalSet::from_members(members))
    }

    async fn collect_inventory(&self) -> InventoryCollection {
        let normalizer = ResourceNormalizer::new(&self.inventory);
        match &self.policies {
            Some(policies) => normalizer.with_policies(policies.as_ref()).collect().await,
            None => normalizer.collect().await,
        }
    }
}
