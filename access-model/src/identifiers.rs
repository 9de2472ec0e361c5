//! # Identifiers
//!
//! Reduces the identifier shapes returned by different Google APIs to a
//! single canonical join key.
//!
//! Three shapes arrive in practice:
//! - **Hierarchical**: `//compute.googleapis.com/projects/p/zones/z/instances/vm-1`,
//!   `https://container.googleapis.com/v1/projects/p/zones/z/clusters/c1`,
//!   `https://www.googleapis.com/compute/v1/projects/p/zones/z/instances/vm-1`,
//!   or relative names such as `projects/p/locations/l/services/api`
//! - **Numeric**: `4419816502436283473`
//! - **Name**: `vm-1`
//!
//! Two identifiers refer to the same resource when their [`CanonicalKey`]s are
//! equal. Keys compare as `(kind, name)` tuples, so `api` and `api-gateway`
//! never merge even though one contains the other.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resources::ResourceKind;

/// Host that prefixes the service name onto the path instead of the host.
const SHARED_API_HOST: &str = "www.googleapis.com";

/// Path segments that introduce a location value.
const LOCATION_COLLECTIONS: &[&str] = &["locations", "zones", "regions"];

/// A parsed resource identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceIdentifier<'a> {
    /// Path-shaped identifier, with the service label when one is present.
    Hierarchical {
        /// Service label (`compute` for `compute.googleapis.com`).
        service: Option<&'a str>,
        /// Non-empty path segments after the host, API version included.
        segments: Vec<&'a str>,
    },
    /// Bare numeric id.
    Numeric(&'a str),
    /// Short display name.
    Name(&'a str),
}

impl<'a> ResourceIdentifier<'a> {
    /// Parse an identifier into its shape.
    ///
    /// # Example
    ///
    /// ```
    /// use access_model::identifiers::ResourceIdentifier;
    ///
    /// assert_eq!(ResourceIdentifier::parse("12345"), ResourceIdentifier::Numeric("12345"));
    /// assert_eq!(ResourceIdentifier::parse("vm-1"), ResourceIdentifier::Name("vm-1"));
    /// assert!(matches!(
    ///     ResourceIdentifier::parse("//run.googleapis.com/projects/p/locations/l/services/s"),
    ///     ResourceIdentifier::Hierarchical { service: Some("run"), .. }
    /// ));
    /// ```
    pub fn parse(raw: &'a str) -> Self {
        if let Some(rest) = raw.strip_prefix("//") {
            return Self::from_host_and_path(rest);
        }
        if let Some((_, rest)) = raw.split_once("://") {
            return Self::from_host_and_path(rest);
        }
        if raw.contains('/') {
            return ResourceIdentifier::Hierarchical {
                service: None,
                segments: split_segments(raw),
            };
        }
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            return ResourceIdentifier::Numeric(raw);
        }
        ResourceIdentifier::Name(raw)
    }

    fn from_host_and_path(rest: &'a str) -> Self {
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        let mut segments = split_segments(path);

        let service = if host == SHARED_API_HOST && !segments.is_empty() {
            Some(segments.remove(0))
        } else {
            host.split('.').next().filter(|label| !label.is_empty())
        };

        ResourceIdentifier::Hierarchical { service, segments }
    }

    /// Get the first collection segment, skipping an API version like `v1`.
    pub fn collection(&self) -> Option<&'a str> {
        match self {
            ResourceIdentifier::Hierarchical { segments, .. } => {
                segments.iter().copied().find(|s| !is_api_version(s))
            }
            _ => None,
        }
    }

    /// Classify the resource kind from the service label.
    ///
    /// Identifiers without a service label classify as [`ResourceKind::Other`].
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceIdentifier::Hierarchical {
                service: Some(service),
                ..
            } => ResourceKind::classify(service, self.collection()),
            _ => ResourceKind::Other,
        }
    }

    /// Get the trailing name: the last path segment, or the identifier itself.
    pub fn name(&self) -> &'a str {
        match self {
            ResourceIdentifier::Hierarchical { segments, service } => segments
                .last()
                .copied()
                .or(*service)
                .unwrap_or_default(),
            ResourceIdentifier::Numeric(id) => id,
            ResourceIdentifier::Name(name) => name,
        }
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn is_api_version(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next() == Some('v') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Get the trailing name of any identifier.
pub fn trailing_name(raw: &str) -> &str {
    ResourceIdentifier::parse(raw).name()
}

/// Get the location segment of a hierarchical identifier.
///
/// Reads the value after `locations/`, `zones/` or `regions/`. The list
/// wildcard `-` is not a location.
///
/// # Example
///
/// ```
/// use access_model::identifiers::location_of;
///
/// assert_eq!(location_of("projects/p/locations/europe-west1/services/api"), Some("europe-west1"));
/// assert_eq!(location_of("projects/p/locations/-/services/api"), None);
/// assert_eq!(location_of("vm-1"), None);
/// ```
pub fn location_of(raw: &str) -> Option<&str> {
    let segments = match ResourceIdentifier::parse(raw) {
        ResourceIdentifier::Hierarchical { segments, .. } => segments,
        _ => return None,
    };

    segments
        .windows(2)
        .find(|pair| LOCATION_COLLECTIONS.contains(&pair[0]))
        .map(|pair| pair[1])
        .filter(|location| *location != "-")
}

/// Canonical join key for a resource: `(kind, name)`.
///
/// Field order makes the derived ordering sort by kind, then name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKey {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Normalized trailing name.
    pub name: String,
}

impl CanonicalKey {
    /// Create a key from a declared kind and a display name.
    ///
    /// Inventory listings use this: they know their kind, and their raw ids
    /// (numeric ids, self-links) do not always carry the name.
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Derive a key from a raw identifier, classifying its kind from the
    /// service label.
    ///
    /// # Example
    ///
    /// ```
    /// use access_model::identifiers::CanonicalKey;
    /// use access_model::resources::ResourceKind;
    ///
    /// let key = CanonicalKey::from_identifier(
    ///     "//container.googleapis.com/projects/p/locations/us-central1/clusters/prod",
    /// );
    /// assert_eq!(key, CanonicalKey::new(ResourceKind::Cluster, "prod"));
    /// ```
    pub fn from_identifier(raw: &str) -> Self {
        let parsed = ResourceIdentifier::parse(raw);
        Self::new(parsed.kind(), parsed.name())
    }

    /// Check whether two raw identifiers refer to the same resource.
    ///
    /// Raw equality is the fast path; key equality decides otherwise.
    pub fn same_resource(a: &str, b: &str) -> bool {
        a == b || Self::from_identifier(a) == Self::from_identifier(b)
    }

    /// Parse the `kind/name` form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, name) = s.split_once('/')?;
        Some(Self::new(ResourceKind::parse(kind)?, name))
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_names() {
        let cases = [
            (
                "//compute.googleapis.com/projects/p/zones/us-central1-a/instances/vm-1",
                ResourceKind::Vm,
                "vm-1",
            ),
            (
                "//container.googleapis.com/projects/p/locations/us-central1/clusters/prod",
                ResourceKind::Cluster,
                "prod",
            ),
            (
                "//run.googleapis.com/projects/p/locations/us-central1/services/api",
                ResourceKind::ManagedService,
                "api",
            ),
            ("//storage.googleapis.com/my-bucket", ResourceKind::Storage, "my-bucket"),
            (
                "//bigquery.googleapis.com/projects/p/datasets/events",
                ResourceKind::Warehouse,
                "events",
            ),
            (
                "//iam.googleapis.com/projects/p/serviceAccounts/ci@p.iam.gserviceaccount.com",
                ResourceKind::WorkloadIdentityAccount,
                "ci@p.iam.gserviceaccount.com",
            ),
            (
                "//cloudresourcemanager.googleapis.com/projects/my-project",
                ResourceKind::Project,
                "my-project",
            ),
            (
                "//cloudresourcemanager.googleapis.com/organizations/1234",
                ResourceKind::Organization,
                "1234",
            ),
            ("//pubsub.googleapis.com/projects/p/topics/t", ResourceKind::Other, "t"),
        ];

        for (raw, kind, name) in cases {
            assert_eq!(CanonicalKey::from_identifier(raw), CanonicalKey::new(kind, name), "{raw}");
        }
    }

    #[test]
    fn test_self_links() {
        let gke = "https://container.googleapis.com/v1/projects/p/zones/us-central1-a/clusters/prod";
        assert_eq!(
            CanonicalKey::from_identifier(gke),
            CanonicalKey::new(ResourceKind::Cluster, "prod")
        );

        let vm = "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a/instances/vm-1";
        assert_eq!(
            CanonicalKey::from_identifier(vm),
            CanonicalKey::new(ResourceKind::Vm, "vm-1")
        );
    }

    #[test]
    fn test_collection_skips_api_version() {
        let parsed = ResourceIdentifier::parse(
            "https://cloudresourcemanager.googleapis.com/v3/projects/my-project",
        );
        assert_eq!(parsed.collection(), Some("projects"));
        assert_eq!(parsed.kind(), ResourceKind::Project);
    }

    #[test]
    fn test_numeric_id_and_asset_name_join_through_declared_kind() {
        // The inventory knows the VM as numeric id 4419816502436283473 named vm-1.
        let inventory = CanonicalKey::new(ResourceKind::Vm, "vm-1");
        let search = CanonicalKey::from_identifier(
            "//compute.googleapis.com/projects/p/zones/us-central1-a/instances/vm-1",
        );
        assert_eq!(inventory, search);

        // The bare numeric id on its own carries no kind.
        assert_eq!(
            CanonicalKey::from_identifier("4419816502436283473"),
            CanonicalKey::new(ResourceKind::Other, "4419816502436283473")
        );
    }

    #[test]
    fn test_substring_names_do_not_merge() {
        let api = "//run.googleapis.com/projects/p/locations/l/services/api";
        let gateway = "//run.googleapis.com/projects/p/locations/l/services/api-gateway";
        assert!(!CanonicalKey::same_resource(api, gateway));
        assert!(!CanonicalKey::same_resource(gateway, api));

        let vm1 = CanonicalKey::new(ResourceKind::Vm, "vm-1");
        let vm10 = CanonicalKey::from_identifier(
            "//compute.googleapis.com/projects/p/zones/z/instances/vm-10",
        );
        assert_ne!(vm1, vm10);
    }

    #[test]
    fn test_same_name_different_kind_do_not_merge() {
        assert!(!CanonicalKey::same_resource(
            "//storage.googleapis.com/data",
            "//bigquery.googleapis.com/projects/p/datasets/data",
        ));
    }

    #[test]
    fn test_same_resource_fast_path_and_fallback() {
        assert!(CanonicalKey::same_resource("12345", "12345"));
        assert!(CanonicalKey::same_resource(
            "https://container.googleapis.com/v1/projects/p/zones/z/clusters/prod",
            "//container.googleapis.com/projects/p/locations/z/clusters/prod",
        ));
    }

    #[test]
    fn test_trailing_name_shapes() {
        assert_eq!(trailing_name("projects/p/locations/l/services/api"), "api");
        assert_eq!(trailing_name("vm-1"), "vm-1");
        assert_eq!(trailing_name("//storage.googleapis.com/bucket/"), "bucket");
        assert_eq!(trailing_name("//storage.googleapis.com"), "storage");
        assert_eq!(trailing_name(""), "");
    }

    #[test]
    fn test_location_of() {
        assert_eq!(
            location_of("projects/p/locations/us-east1/services/api"),
            Some("us-east1")
        );
        assert_eq!(
            location_of("//compute.googleapis.com/projects/p/zones/europe-west1-b/instances/vm"),
            Some("europe-west1-b")
        );
        assert_eq!(location_of("projects/p/regions/asia-east1/subnetworks/s"), Some("asia-east1"));
        assert_eq!(location_of("projects/p/services/api"), None);
        assert_eq!(location_of("12345"), None);
    }

    #[test]
    fn test_display_and_parse() {
        let key = CanonicalKey::new(ResourceKind::ManagedService, "api");
        assert_eq!(key.to_string(), "managed_service/api");
        assert_eq!(CanonicalKey::parse("managed_service/api"), Some(key));

        // Names may themselves contain slashes only after the kind separator.
        let key = CanonicalKey::parse("other/a/b").unwrap();
        assert_eq!(key.name, "a/b");
        assert_eq!(CanonicalKey::parse("nonsense"), None);
    }
}
