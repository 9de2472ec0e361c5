//! # Access Model
//!
//! This crate provides the I/O-free vocabulary used to reconcile a cloud
//! project's IAM data into a single access relation.
//!
//! ## Overview
//!
//! The access-model crate handles:
//! - **Principals**: Typed identities parsed from raw IAM member strings
//! - **Resource Kinds**: The closed set of resource kinds and the service classification table
//! - **Identifiers**: Canonical join keys for self-links, numeric ids and asset names
//! - **Roles**: Which resource kinds a project-level role cascades to
//!
//! ## Architecture
//!
//! ```text
//! "user:alice@example.com"                          -> Principal { alice@example.com, IndividualUser }
//! "//compute.googleapis.com/projects/p/zones/z/instances/vm-1"
//!                                                   -> CanonicalKey { Vm, "vm-1" }
//! "roles/compute.admin"                             -> RoleScope::Kinds([Vm])
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use access_model::{CanonicalKey, Principal, PrincipalKind, ResourceKind, RoleScope};
//!
//! let principal = Principal::parse("serviceAccount:ci@p.iam.gserviceaccount.com");
//! assert_eq!(principal.kind, PrincipalKind::WorkloadIdentity);
//!
//! // Inventory and policy search agree on the key even though the raw ids differ.
//! let from_inventory = CanonicalKey::new(ResourceKind::Vm, "vm-1");
//! let from_search =
//!     CanonicalKey::from_identifier("//compute.googleapis.com/projects/p/zones/z/instances/vm-1");
//! assert_eq!(from_inventory, from_search);
//!
//! assert!(RoleScope::for_role("roles/editor").applies_to(ResourceKind::Storage));
//! assert!(!RoleScope::for_role("roles/pubsub.publisher").applies_to(ResourceKind::Vm));
//! ```
//!
//! ## Matching Rules
//!
//! Resource identity is always `(kind, name)` tuple equality. Substring or
//! suffix matching between differently-shaped identifiers is never used.

pub mod identifiers;
pub mod principal;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use identifiers::{location_of, trailing_name, CanonicalKey, ResourceIdentifier};
pub use principal::{Principal, PrincipalKind};
pub use resources::{ResourceKind, ServiceRule, SERVICE_RULES};
pub use roles::{RolePattern, RoleRule, RoleScope, ROLE_RULES};
