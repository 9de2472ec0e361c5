//! Inheritance resolution
//!
//! Propagates project-level grants down to child resources, following the
//! role applicability table in [`access_model::roles`].
//!
//! ```text
//! alice: roles/editor on projects/p      (direct)
//!   ├─ vm/vm-1           roles/editor    (inherited)
//!   ├─ storage/logs      roles/editor    (inherited)
//!   └─ cluster/prod      roles/editor    (inherited)
//!
//! ci:    roles/run.invoker on projects/p (direct)
//!   └─ managed_service/api  roles/run.invoker (inherited)
//!
//! bob:   roles/pubsub.publisher on projects/p (direct, does not cascade)
//! ```

use access_model::{CanonicalKey, Principal, RoleScope};
use tracing::{debug, info};

use crate::facts::{AccessFact, FactKey, FactSet};
use crate::resources::ResourceSet;

/// Synthesizes inherited facts from project-scoped direct facts.
#[derive(Debug, Clone)]
pub struct InheritanceResolver {
    project: CanonicalKey,
}

impl InheritanceResolver {
    /// Create a resolver for the project identified by `project`.
    pub fn new(project: CanonicalKey) -> Self {
        Self { project }
    }

    /// Compute the inherited facts implied by `facts` over `resources`.
    ///
    /// Pure: reads only direct facts on the project, skips the project itself,
    /// and never emits a fact whose key already has a direct fact. Calling it
    /// again after [`apply`](Self::apply) returns the same facts.
    pub fn resolve(&self, facts: &FactSet, resources: &ResourceSet) -> Vec<AccessFact> {
        let project_grants: Vec<(&Principal, &str, RoleScope)> = facts
            .direct_on(&self.project)
            .map(|fact| {
                (
                    &fact.principal,
                    fact.role.as_str(),
                    RoleScope::for_role(&fact.role),
                )
            })
            .collect();

        let principals: std::collections::BTreeSet<&str> = project_grants
            .iter()
            .map(|(principal, _, _)| principal.identifier.as_str())
            .collect();
        info!(
            project = %self.project.name,
            principals = principals.len(),
            grants = project_grants.len(),
            "Resolving project-level grants"
        );

        let mut inherited = Vec::new();
        for (principal, role, scope) in project_grants {
            if !scope.cascades() {
                debug!(principal = %principal, role = %role, "Role does not cascade");
                continue;
            }

            for resource in resources.iter() {
                if resource.key == self.project || !scope.applies_to(resource.kind()) {
                    continue;
                }

                let key = FactKey {
                    principal: principal.identifier.clone(),
                    resource: resource.key.clone(),
                    role: role.to_string(),
                };
                if facts.has_direct(&key) {
                    continue;
                }

                inherited.push(AccessFact::inherited(
                    principal.clone(),
                    resource.key.clone(),
                    role,
                ));
            }
        }

        inherited
    }

    /// Resolve and add the inherited facts to `facts`. Returns how many were
    /// new.
    pub fn apply(&self, facts: &mut FactSet, resources: &ResourceSet) -> usize {
        let inherited = self.resolve(facts, resources);
        let added = inherited
            .into_iter()
            .filter(|fact| facts.record_inherited(fact.clone()))
            .count();
        info!(inherited = added, "Inherited grants added");
        added
    }
}
