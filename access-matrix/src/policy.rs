//! Policy stream reduction
//!
//! Folds the project-wide policy search stream into direct access facts.
//! The stream is the authoritative source of grants: every resource kind
//! arrives through it, including ones no inventory backend lists.

use access_model::Principal;
use tracing::{debug, info};

use crate::error::SourceResult;
use crate::facts::FactSet;
use crate::principals::PrincipalSet;
use crate::resources::ResourceSet;
use crate::sources::{Cursor, PolicyRecord};

/// State produced by reducing the policy stream.
#[derive(Debug, Default)]
pub struct PolicyReduction {
    /// Inventory resources plus anything first seen in the stream.
    pub resources: ResourceSet,
    /// Directory principals plus anything first seen in the stream.
    pub principals: PrincipalSet,
    /// Direct facts.
    pub facts: FactSet,
}

/// Accumulates direct grants from policy records.
#[derive(Debug, Default)]
pub struct PolicyStreamReducer {
    state: PolicyReduction,
    records: usize,
}

impl PolicyStreamReducer {
    /// Create a reducer seeded with the inventory and the directory.
    pub fn new(resources: ResourceSet, principals: PrincipalSet) -> Self {
        Self {
            state: PolicyReduction {
                resources,
                principals,
                facts: FactSet::new(),
            },
            records: 0,
        }
    }

    /// Fold one policy record.
    pub fn absorb(&mut self, record: PolicyRecord) {
        self.records += 1;
        let PolicyReduction {
            resources,
            principals,
            facts,
        } = &mut self.state;

        let resource = resources.ensure_discovered(&record.resource);
        let key = resource.key.clone();

        for binding in record.bindings {
            for member in &binding.members {
                let principal = Principal::parse(member);
                if principals.observe(principal.clone()) {
                    debug!(
                        principal = %principal,
                        resource = %key,
                        "Principal found only through resource-level grant"
                    );
                }
                resource.grant(binding.role.clone(), principal.clone());
                facts.record_direct(principal, key.clone(), binding.role.clone());
            }
        }
    }

    /// Drain `cursor` to exhaustion.
    ///
    /// Any failure aborts the reduction: a partially read stream would
    /// under-report access.
    pub async fn consume(
        mut self,
        cursor: &mut dyn Cursor<PolicyRecord>,
    ) -> SourceResult<PolicyReduction> {
        while let Some(record) = cursor.next().await? {
            self.absorb(record);
        }
        Ok(self.finish())
    }

    /// Finish reducing and hand back the accumulated state.
    pub fn finish(self) -> PolicyReduction {
        info!(
            records = self.records,
            resources = self.state.resources.len(),
            principals = self.state.principals.len(),
            facts = self.state.facts.len(),
            "Policy stream reduced"
        );
        self.state
    }
}
