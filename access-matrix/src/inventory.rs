//! Resource normalization
//!
//! Turns the typed inventory listings into [`Resource`]s. Inventory is
//! best-effort: a failing backend, a failing partition, or a failing
//! per-resource policy lookup is recorded as an [`InventoryWarning`] and the
//! rest of the inventory is still collected.

use access_model::{CanonicalKey, Principal};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::resources::{Resource, ResourceSet};
use crate::sources::{InventoryRecord, InventorySource, PolicyGetter};

/// A recoverable inventory failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum InventoryWarning {
    /// A whole backend could not be listed.
    Backend {
        /// Backend name.
        backend: String,
        /// Failure message.
        message: String,
    },
    /// One partition stopped early; records before the failure are kept.
    Partition {
        /// Backend name.
        backend: String,
        /// Partition (zone) name.
        partition: String,
        /// Failure message.
        message: String,
    },
    /// A resource's IAM policy could not be read; its grants are left empty.
    Enrichment {
        /// Backend name.
        backend: String,
        /// Resource canonical id.
        resource: String,
        /// Failure message.
        message: String,
    },
}

/// Output of one inventory collection.
#[derive(Debug, Default)]
pub struct InventoryCollection {
    /// Normalized resources.
    pub resources: ResourceSet,
    /// Recoverable failures hit along the way.
    pub warnings: Vec<InventoryWarning>,
}

/// Collects and normalizes inventory from every configured backend.
pub struct ResourceNormalizer<'a> {
    sources: &'a [Arc<dyn InventorySource>],
    policies: Option<&'a dyn PolicyGetter>,
}

impl<'a> ResourceNormalizer<'a> {
    /// Create a normalizer over `sources`.
    pub fn new(sources: &'a [Arc<dyn InventorySource>]) -> Self {
        Self {
            sources,
            policies: None,
        }
    }

    /// Enrich each resource with its own IAM policy.
    pub fn with_policies(mut self, policies: &'a dyn PolicyGetter) -> Self {
        self.policies = Some(policies);
        self
    }

    /// Collect every backend.
    ///
    /// Backends run one after another; partitions of a backend and the
    /// per-resource policy lookups run concurrently. Results are folded into
    /// the set serially.
    pub async fn collect(&self) -> InventoryCollection {
        let mut collection = InventoryCollection::default();

        for source in self.sources {
            self.collect_backend(source.as_ref(), &mut collection).await;
        }

        info!(
            resources = collection.resources.len(),
            warnings = collection.warnings.len(),
            "Inventory collected"
        );
        collection
    }

    async fn collect_backend(&self, source: &dyn InventorySource, out: &mut InventoryCollection) {
        let backend = source.backend().to_string();

        let partitions = match source.partitions().await {
            Ok(partitions) => partitions,
            Err(e) => {
                warn!(backend = %backend, error = %e, "Failed to list inventory partitions");
                out.warnings.push(InventoryWarning::Backend {
                    backend,
                    message: e.to_string(),
                });
                return;
            }
        };

        let listings = join_all(
            partitions
                .iter()
                .map(|partition| list_partition(source, partition)),
        )
        .await;

        let single_partition = partitions.len() == 1;
        let mut records = Vec::new();
        for (partition, (listed, failure)) in partitions.into_iter().zip(listings) {
            records.extend(listed);
            if let Some(e) = failure {
                warn!(
                    backend = %backend,
                    partition = %partition,
                    error = %e,
                    "Inventory listing stopped early"
                );
                out.warnings.push(if single_partition {
                    InventoryWarning::Backend {
                        backend: backend.clone(),
                        message: e.to_string(),
                    }
                } else {
                    InventoryWarning::Partition {
                        backend: backend.clone(),
                        partition,
                        message: e.to_string(),
                    }
                });
            }
        }

        debug!(backend = %backend, records = records.len(), "Inventory backend listed");

        let normalized = join_all(records.into_iter().map(|record| self.normalize(source, record))).await;
        for (resource, failure) in normalized {
            if let Some(e) = failure {
                warn!(
                    backend = %backend,
                    resource = %resource.canonical_id,
                    error = %e,
                    "Failed to read resource IAM policy"
                );
                out.warnings.push(InventoryWarning::Enrichment {
                    backend: backend.clone(),
                    resource: resource.canonical_id.clone(),
                    message: e.to_string(),
                });
            }
            out.resources.insert(resource);
        }
    }

    /// Map one record to a resource under the backend's declared kind.
    async fn normalize(
        &self,
        source: &dyn InventorySource,
        record: InventoryRecord,
    ) -> (Resource, Option<SourceError>) {
        let key = CanonicalKey::new(source.kind(), record.display_name());
        let mut resource = Resource::from_inventory(key, record.raw_id(), record.location());
        resource.aliases.extend(record.aliases());

        let Some(policies) = self.policies else {
            return (resource, None);
        };

        match policies.get_policy(&record).await {
            Ok(bindings) => {
                for binding in bindings {
                    for member in &binding.members {
                        resource.grant(binding.role.clone(), Principal::parse(member));
                    }
                }
                (resource, None)
            }
            Err(e) => (resource, Some(e)),
        }
    }
}

/// List one partition to exhaustion or first failure.
async fn list_partition(
    source: &dyn InventorySource,
    partition: &str,
) -> (Vec<InventoryRecord>, Option<SourceError>) {
    let mut cursor = match source.list(partition).await {
        Ok(cursor) => cursor,
        Err(e) => return (Vec::new(), Some(e)),
    };

    let mut records = Vec::new();
    loop {
        match cursor.next().await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => return (records, None),
            Err(e) => return (records, Some(e)),
        }
    }
}
