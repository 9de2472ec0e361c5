//! # Resource Kinds
//!
//! Defines the closed set of resource kinds tracked in an access matrix and
//! the table that classifies a Google API service into one of them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of resource that can be the target of an access grant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Kubernetes cluster (GKE).
    Cluster,
    /// Compute Engine VM instance.
    Vm,
    /// Managed service (Cloud Run).
    ManagedService,
    /// Storage bucket.
    Storage,
    /// Data warehouse dataset or table (BigQuery).
    Warehouse,
    /// Cloud project.
    Project,
    /// Service account.
    WorkloadIdentityAccount,
    /// Organization node.
    Organization,
    /// Anything the classification table does not know.
    Other,
}

impl ResourceKind {
    /// Get the string representation of the resource kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Cluster => "cluster",
            ResourceKind::Vm => "vm",
            ResourceKind::ManagedService => "managed_service",
            ResourceKind::Storage => "storage",
            ResourceKind::Warehouse => "warehouse",
            ResourceKind::Project => "project",
            ResourceKind::WorkloadIdentityAccount => "workload_identity_account",
            ResourceKind::Organization => "organization",
            ResourceKind::Other => "other",
        }
    }

    /// Parse resource kind from string representation.
    ///
    /// Accepts the product names used by the console as aliases.
    ///
    /// # Example
    ///
    /// ```
    /// use access_model::resources::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::parse("vm"), Some(ResourceKind::Vm));
    /// assert_eq!(ResourceKind::parse("gke"), Some(ResourceKind::Cluster));
    /// assert_eq!(ResourceKind::parse("cloudrun"), Some(ResourceKind::ManagedService));
    /// assert_eq!(ResourceKind::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cluster" | "clusters" | "gke" => Some(ResourceKind::Cluster),
            "vm" | "vms" | "instance" | "instances" => Some(ResourceKind::Vm),
            "managed_service" | "managedservice" | "cloudrun" | "cloud_run" => {
                Some(ResourceKind::ManagedService)
            }
            "storage" | "bucket" | "buckets" => Some(ResourceKind::Storage),
            "warehouse" | "bigquery" | "dataset" | "datasets" => Some(ResourceKind::Warehouse),
            "project" | "projects" => Some(ResourceKind::Project),
            "workload_identity_account" | "serviceaccount" | "service_account" => {
                Some(ResourceKind::WorkloadIdentityAccount)
            }
            "organization" | "organizations" | "org" => Some(ResourceKind::Organization),
            "other" => Some(ResourceKind::Other),
            _ => None,
        }
    }

    /// Get all resource kinds.
    pub fn all() -> Vec<Self> {
        vec![
            ResourceKind::Cluster,
            ResourceKind::Vm,
            ResourceKind::ManagedService,
            ResourceKind::Storage,
            ResourceKind::Warehouse,
            ResourceKind::Project,
            ResourceKind::WorkloadIdentityAccount,
            ResourceKind::Organization,
            ResourceKind::Other,
        ]
    }

    /// Classify a service label, optionally narrowed by the first collection
    /// segment of the resource path.
    ///
    /// Lookup is exact on the service label; the first matching rule wins.
    ///
    /// # Example
    ///
    /// ```
    /// use access_model::resources::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::classify("compute", Some("projects")), ResourceKind::Vm);
    /// assert_eq!(
    ///     ResourceKind::classify("cloudresourcemanager", Some("organizations")),
    ///     ResourceKind::Organization
    /// );
    /// assert_eq!(ResourceKind::classify("pubsub", Some("projects")), ResourceKind::Other);
    /// ```
    pub fn classify(service: &str, collection: Option<&str>) -> Self {
        SERVICE_RULES
            .iter()
            .find(|rule| rule.matches(service, collection))
            .map(|rule| rule.kind)
            .unwrap_or(ResourceKind::Other)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the service classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRule {
    /// Service label, e.g. `compute` for `compute.googleapis.com`.
    pub service: &'static str,
    /// Required first collection segment, if the service hosts several kinds.
    pub collection: Option<&'static str>,
    /// Kind assigned on match.
    pub kind: ResourceKind,
}

impl ServiceRule {
    fn matches(&self, service: &str, collection: Option<&str>) -> bool {
        self.service == service && (self.collection.is_none() || self.collection == collection)
    }
}

/// Service classification table. Anything absent is [`ResourceKind::Other`].
pub const SERVICE_RULES: &[ServiceRule] = &[
    ServiceRule {
        service: "cloudresourcemanager",
        collection: Some("projects"),
        kind: ResourceKind::Project,
    },
    ServiceRule {
        service: "cloudresourcemanager",
        collection: Some("organizations"),
        kind: ResourceKind::Organization,
    },
    ServiceRule {
        service: "compute",
        collection: None,
        kind: ResourceKind::Vm,
    },
    ServiceRule {
        service: "container",
        collection: None,
        kind: ResourceKind::Cluster,
    },
    ServiceRule {
        service: "run",
        collection: None,
        kind: ResourceKind::ManagedService,
    },
    ServiceRule {
        service: "storage",
        collection: None,
        kind: ResourceKind::Storage,
    },
    ServiceRule {
        service: "bigquery",
        collection: None,
        kind: ResourceKind::Warehouse,
    },
    ServiceRule {
        service: "iam",
        collection: None,
        kind: ResourceKind::WorkloadIdentityAccount,
    },
];
