//! External collaborators
//!
//! Traits for the API clients the aggregation reads from, and the plain
//! records they return. Implementations live outside this crate (see
//! `access-gcp`); tests use in-memory fakes.

use access_model::{location_of, trailing_name};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};

/// Partition name for listings that are not split by location.
pub const ALL_LOCATIONS: &str = "-";

/// A lazy, finite, non-restartable sequence.
///
/// `Ok(None)` ends the sequence. After an error the cursor must not be
/// polled again; callers restart the whole listing instead.
#[async_trait]
pub trait Cursor<T: Send>: Send {
    /// Fetch the next item.
    async fn next(&mut self) -> SourceResult<Option<T>>;
}

/// Cursor over an in-memory list, optionally failing once the list is drained.
pub struct VecCursor<T> {
    items: std::vec::IntoIter<T>,
    error: Option<SourceError>,
}

impl<T> VecCursor<T> {
    /// Create a cursor that yields `items` and then ends.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
            error: None,
        }
    }

    /// Create a cursor that yields `items` and then fails with `error`.
    pub fn failing_after(items: Vec<T>, error: SourceError) -> Self {
        Self {
            items: items.into_iter(),
            error: Some(error),
        }
    }
}

#[async_trait]
impl<T: Send> Cursor<T> for VecCursor<T> {
    async fn next(&mut self) -> SourceResult<Option<T>> {
        if let Some(item) = self.items.next() {
            return Ok(Some(item));
        }
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }
}

/// Drain a cursor into a vector, stopping at the first error.
pub async fn collect_all<T: Send>(cursor: &mut dyn Cursor<T>) -> SourceResult<Vec<T>> {
    let mut items = Vec::new();
    while let Some(item) = cursor.next().await? {
        items.push(item);
    }
    Ok(items)
}

/// One IAM binding: a role and the members holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Binding {
    /// Role name, e.g. `roles/viewer`.
    pub role: String,
    /// Raw member strings, e.g. `user:alice@example.com`.
    #[serde(default)]
    pub members: Vec<String>,
}

impl Binding {
    /// Create a binding.
    pub fn new<I, S>(role: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: role.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// One entry of the policy search stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRecord {
    /// Full resource name of the bound resource.
    pub resource: String,
    /// Bindings attached directly to the resource.
    pub bindings: Vec<Binding>,
}

impl PolicyRecord {
    /// Create a policy record.
    pub fn new(resource: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self {
            resource: resource.into(),
            bindings,
        }
    }
}

/// A Kubernetes cluster as listed by the container API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterRecord {
    /// Cluster name.
    pub name: String,
    /// Self-link URL.
    #[serde(default)]
    pub self_link: String,
    /// Region or zone.
    #[serde(default)]
    pub location: String,
}

/// A VM instance as listed by the compute API for one zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceRecord {
    /// Numeric instance id.
    pub id: u64,
    /// Instance name.
    pub name: String,
    /// Zone the instance was listed in.
    pub zone: String,
    /// Self-link URL.
    #[serde(default)]
    pub self_link: String,
}

/// A managed service as listed by the Cloud Run API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Full name, `projects/P/locations/L/services/S`.
    pub name: String,
    /// Public URL, when the API reports one.
    #[serde(default)]
    pub uri: Option<String>,
}

/// A record returned by one of the inventory backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryRecord {
    /// Kubernetes cluster.
    Cluster(ClusterRecord),
    /// VM instance.
    Instance(InstanceRecord),
    /// Managed service.
    Service(ServiceRecord),
}

impl InventoryRecord {
    /// Get the display name (the trailing name of hierarchical names).
    pub fn display_name(&self) -> &str {
        match self {
            InventoryRecord::Cluster(c) => &c.name,
            InventoryRecord::Instance(i) => &i.name,
            InventoryRecord::Service(s) => trailing_name(&s.name),
        }
    }

    /// Get the identifier the backend uses for this record.
    pub fn raw_id(&self) -> String {
        match self {
            InventoryRecord::Cluster(c) if !c.self_link.is_empty() => c.self_link.clone(),
            InventoryRecord::Cluster(c) => c.name.clone(),
            InventoryRecord::Instance(i) => i.id.to_string(),
            InventoryRecord::Service(s) => s.name.clone(),
        }
    }

    /// Get every raw identifier this record is known by.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases = vec![self.raw_id()];
        match self {
            InventoryRecord::Cluster(_) => {}
            InventoryRecord::Instance(i) => aliases.push(i.self_link.clone()),
            InventoryRecord::Service(s) => aliases.extend(s.uri.clone()),
        }
        aliases.retain(|alias| !alias.is_empty());
        aliases.dedup();
        aliases
    }

    /// Get the location, if the record carries one.
    pub fn location(&self) -> Option<&str> {
        let location = match self {
            InventoryRecord::Cluster(c) => c.location.as_str(),
            InventoryRecord::Instance(i) => trailing_name(&i.zone),
            InventoryRecord::Service(s) => location_of(&s.name)?,
        };
        Some(location).filter(|l| !l.is_empty())
    }
}

/// A typed inventory listing for one resource kind.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Backend name used in logs and warnings, e.g. `compute`.
    fn backend(&self) -> &str;

    /// Resource kind every record of this backend is declared as.
    fn kind(&self) -> access_model::ResourceKind;

    /// Partitions to list. Zonal backends return their zones; others list
    /// everything under [`ALL_LOCATIONS`].
    async fn partitions(&self) -> SourceResult<Vec<String>> {
        Ok(vec![ALL_LOCATIONS.to_string()])
    }

    /// Open a listing of one partition.
    async fn list(&self, partition: &str) -> SourceResult<Box<dyn Cursor<InventoryRecord>>>;
}

/// Per-resource IAM policy lookup, used for best-effort enrichment.
#[async_trait]
pub trait PolicyGetter: Send + Sync {
    /// Fetch the bindings attached directly to `record`.
    async fn get_policy(&self, record: &InventoryRecord) -> SourceResult<Vec<Binding>>;
}

/// Project-level principal directory.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// List the raw member strings bound anywhere in the project's IAM policy.
    async fn list_members(&self, project_id: &str) -> SourceResult<Vec<String>>;
}

/// Project-wide IAM policy search.
#[async_trait]
pub trait PolicySearch: Send + Sync {
    /// Open a stream over every IAM policy under `scope`.
    async fn search_all(&self, scope: &str) -> SourceResult<Box<dyn Cursor<PolicyRecord>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vec_cursor_ends() {
        let mut cursor = VecCursor::new(vec![1, 2]);
        assert_eq!(cursor.next().await.unwrap(), Some(1));
        assert_eq!(cursor.next().await.unwrap(), Some(2));
        assert_eq!(cursor.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_collect_all_stops_at_error() {
        let mut cursor = VecCursor::failing_after(
            vec!["a"],
            SourceError::Request("reset".to_string()),
        );
        let result = collect_all(&mut cursor).await;
        assert!(matches!(result, Err(SourceError::Request(_))));
    }

    #[test]
    fn test_instance_record_fields() {
        let record = InventoryRecord::Instance(InstanceRecord {
            id: 4419816502436283473,
            name: "vm-1".to_string(),
            zone: "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a"
                .to_string(),
            self_link: "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a/instances/vm-1"
                .to_string(),
        });

        assert_eq!(record.display_name(), "vm-1");
        assert_eq!(record.raw_id(), "4419816502436283473");
        assert_eq!(record.location(), Some("us-central1-a"));
        assert_eq!(record.aliases().len(), 2);
    }

    #[test]
    fn test_service_record_location_is_parsed() {
        let record = InventoryRecord::Service(ServiceRecord {
            name: "projects/p/locations/europe-west1/services/api".to_string(),
            uri: Some("https://api-xyz.a.run.app".to_string()),
        });

        assert_eq!(record.display_name(), "api");
        assert_eq!(record.location(), Some("europe-west1"));
        assert_eq!(
            record.aliases(),
            vec![
                "projects/p/locations/europe-west1/services/api".to_string(),
                "https://api-xyz.a.run.app".to_string(),
            ]
        );
    }

    #[test]
    fn test_cluster_without_self_link_uses_name() {
        let record = InventoryRecord::Cluster(ClusterRecord {
            name: "prod".to_string(),
            self_link: String::new(),
            location: String::new(),
        });

        assert_eq!(record.raw_id(), "prod");
        assert_eq!(record.location(), None);
    }
}
