//! Matrix assembly
//!
//! Groups facts by `(principal, resource)` into [`AccessEntry`] role sets and
//! emits the final principal, resource and entry lists. Origins are dropped
//! here; callers only see which roles a principal holds.

use access_model::{CanonicalKey, Principal, PrincipalKind, ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::facts::FactSet;
use crate::inventory::InventoryWarning;
use crate::principals::PrincipalSet;
use crate::resources::{Resource, ResourceSet};

/// Roles a principal holds on one resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessEntry {
    /// Principal identifier.
    pub principal: String,
    /// Principal kind.
    pub principal_kind: PrincipalKind,
    /// Resource canonical id.
    pub resource_id: String,
    /// Resource display name.
    pub resource_name: String,
    /// Resource kind.
    pub resource_kind: ResourceKind,
    /// Roles held, never empty.
    pub roles: BTreeSet<String>,
}

/// The complete access relation for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessMatrix {
    /// Project the matrix describes.
    pub project_id: String,
    /// Aggregation run that produced the matrix.
    pub run_id: Uuid,
    /// When the matrix was assembled.
    pub generated_at: DateTime<Utc>,
    /// Every principal, ordered by identifier.
    pub principals: Vec<Principal>,
    /// Every resource, ordered by canonical key.
    pub resources: Vec<Resource>,
    /// Entries ordered by principal identifier, then resource key.
    pub access: Vec<AccessEntry>,
    /// Recoverable inventory failures.
    #[serde(default)]
    pub warnings: Vec<InventoryWarning>,
}

impl AccessMatrix {
    /// Get the roles `principal` holds on `resource`.
    pub fn roles_for(&self, principal: &str, resource: &CanonicalKey) -> Option<&BTreeSet<String>> {
        let resource_id = resource.to_string();
        self.access
            .iter()
            .find(|e| e.principal == principal && e.resource_id == resource_id)
            .map(|e| &e.roles)
    }

    /// Get every entry for `principal`.
    pub fn entries_for(&self, principal: &str) -> impl Iterator<Item = &AccessEntry> {
        let principal = principal.to_string();
        self.access.iter().filter(move |e| e.principal == principal)
    }

    /// Get a principal by identifier.
    pub fn principal(&self, identifier: &str) -> Option<&Principal> {
        self.principals.iter().find(|p| p.identifier == identifier)
    }

    /// Get a resource by key.
    pub fn resource(&self, key: &CanonicalKey) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.key == key)
    }
}

/// Folds the pass state into an [`AccessMatrix`].
#[derive(Debug, Clone)]
pub struct MatrixAssembler {
    project_id: String,
    run_id: Uuid,
}

impl MatrixAssembler {
    /// Create an assembler for one run.
    pub fn new(project_id: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            project_id: project_id.into(),
            run_id,
        }
    }

    /// Assemble the matrix.
    ///
    /// Every principal referenced by a fact is added to the principal list if
    /// it is missing. Facts whose resource is not tracked are dropped.
    pub fn assemble(
        &self,
        mut principals: PrincipalSet,
        resources: ResourceSet,
        facts: &FactSet,
        warnings: Vec<InventoryWarning>,
    ) -> AccessMatrix {
        let mut grouped: BTreeMap<(&str, &CanonicalKey), (PrincipalKind, BTreeSet<String>)> =
            BTreeMap::new();

        for fact in facts.iter() {
            if !resources.contains(&fact.resource) {
                tracing::debug!(resource = %fact.resource, "Dropping fact for untracked resource");
                continue;
            }
            principals.observe(fact.principal.clone());
            grouped
                .entry((fact.principal.identifier.as_str(), &fact.resource))
                .or_insert_with(|| (fact.principal.kind, BTreeSet::new()))
                .1
                .insert(fact.role.clone());
        }

        let access = grouped
            .into_iter()
            .filter_map(|((principal, key), (principal_kind, roles))| {
                let resource = resources.get(key)?;
                Some(AccessEntry {
                    principal: principal.to_string(),
                    principal_kind,
                    resource_id: resource.canonical_id.clone(),
                    resource_name: resource.display_name.clone(),
                    resource_kind: resource.kind(),
                    roles,
                })
            })
            .collect();

        AccessMatrix {
            project_id: self.project_id.clone(),
            run_id: self.run_id,
            generated_at: Utc::now(),
            principals: principals.into_vec(),
            resources: resources.into_vec(),
            access,
            warnings,
        }
    }
}
