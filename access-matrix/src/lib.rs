//! # Access Matrix
//!
//! This crate reconciles a cloud project's IAM data into a single relation:
//! which principal holds which role on which resource.
//!
//! ## Overview
//!
//! Three independently-shaped sources are merged:
//! - **Inventory**: typed listings (clusters, VMs, managed services), each with its own id scheme
//! - **Policy search**: a project-wide stream of IAM bindings keyed by full resource names
//! - **Principal directory**: the members bound in the project's own IAM policy
//!
//! Project-level grants are then propagated to child resources whose kind the
//! role applies to, without ever replacing a grant bound directly on the child.
//!
//! ## Architecture
//!
//! ```text
//! sources      collaborator traits (InventorySource, PolicyGetter, PrincipalDirectory, PolicySearch)
//! inventory    ResourceNormalizer   → ResourceSet + warnings
//! policy       PolicyStreamReducer  → direct FactSet
//! inheritance  InheritanceResolver  → inherited facts
//! assembler    MatrixAssembler      → AccessMatrix
//! service      AccessMatrixService  → runs the stages in order
//! ```
//!
//! ## Failure Model
//!
//! - Inventory, partition and per-resource policy failures are recorded in
//!   [`AccessMatrix::warnings`] and logged; the pass continues.
//! - Directory and policy search failures abort the pass with a
//!   [`MatrixError`] naming the stage.
//! - No retries happen here; retry policy belongs to the collaborators.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use access_matrix::{AccessMatrixService, MatrixConfig};
//! use access_matrix::sources::{InventorySource, PolicySearch, PrincipalDirectory};
//! use std::sync::Arc;
//!
//! async fn run(
//!     directory: Arc<dyn PrincipalDirectory>,
//!     search: Arc<dyn PolicySearch>,
//!     vms: Arc<dyn InventorySource>,
//! ) -> Result<(), access_matrix::MatrixError> {
//!     let config = MatrixConfig::from_env()?;
//!     let service = AccessMatrixService::new(config, directory, search)?.with_inventory(vms);
//!
//!     let matrix = service.compute_access_matrix().await?;
//!     for entry in &matrix.access {
//!         println!("{} {} {:?}", entry.principal, entry.resource_id, entry.roles);
//!     }
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod facts;
pub mod inheritance;
pub mod inventory;
pub mod policy;
pub mod principals;
pub mod resources;
pub mod service;
pub mod sources;

// Re-export main types for convenience
pub use assembler::{AccessEntry, AccessMatrix, MatrixAssembler};
pub use config::{ConfigError, ConfigResult, MatrixConfig};
pub use error::{MatrixError, MatrixResult, SourceError, SourceResult};
pub use facts::{AccessFact, FactKey, FactSet, Origin};
pub use inheritance::InheritanceResolver;
pub use inventory::{InventoryCollection, InventoryWarning, ResourceNormalizer};
pub use policy::{PolicyReduction, PolicyStreamReducer};
pub use principals::PrincipalSet;
pub use resources::{Resource, ResourceOrigin, ResourceSet, UNKNOWN_LOCATION};
pub use service::AccessMatrixService;
pub use sources::{
    Binding, ClusterRecord, Cursor, InstanceRecord, InventoryRecord, InventorySource,
    PolicyGetter, PolicyRecord, PolicySearch, PrincipalDirectory, ServiceRecord, VecCursor,
    ALL_LOCATIONS,
};
