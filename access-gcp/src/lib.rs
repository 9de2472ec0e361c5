//! # Access GCP
//!
//! REST implementations of the access matrix collaborators for Google Cloud.
//!
//! ## Clients
//!
//! | client | API | trait |
//! |---|---|---|
//! | [`ResourceManagerClient`] | `POST /v1/projects/{p}:getIamPolicy` | `PrincipalDirectory` |
//! | [`AssetClient`] | `GET /v1/{scope}:searchAllIamPolicies` | `PolicySearch` |
//! | [`ContainerClient`] | `GET /v1/projects/{p}/locations/-/clusters` | `InventorySource` |
//! | [`ComputeClient`] | `GET /compute/v1/projects/{p}/zones/{z}/instances` | `InventorySource` |
//! | [`RunClient`] | `GET /v2/projects/{p}/locations/-/services` | `InventorySource` |
//! | [`GcpPolicyGetter`] | compute and run `getIamPolicy` | `PolicyGetter` |
//!
//! Every request carries the configured bearer token and is retried with
//! exponential backoff on transport failures, throttling and 5xx responses.
//! Paged listings are walked lazily through `nextPageToken`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use access_gcp::{GcpClients, GcpConfig};
//! use access_matrix::MatrixConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let matrix = MatrixConfig::new("my-project");
//! let gcp = GcpConfig::from_env();
//! gcp.validate_for_production()?;
//!
//! let service = GcpClients::new(&gcp, &matrix)?.access_matrix_service(matrix)?;
//! let principals = service.list_principals().await?;
//! println!("{} principals", principals.len());
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;

// Re-export main types for convenience
pub use clients::{
    AssetClient, ComputeClient, ContainerClient, GcpClients, GcpPolicyGetter, IamPolicy,
    ResourceManagerClient, RunClient,
};
pub use config::{GcpConfig, ServiceEndpoint};
pub use error::{GcpError, GcpResult};
pub use http::{GcpHttp, Page, PageCursor};
pub use retry::{with_retry_if, RetryConfig};
