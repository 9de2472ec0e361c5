//! Access facts
//!
//! An [`AccessFact`] says a principal holds a role on a resource, and whether
//! that was bound there directly or inherited from the project. The
//! [`FactSet`] keeps at most one fact per `(principal, resource, role)` and
//! never lets an inherited fact replace a direct one.

use access_model::{CanonicalKey, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a fact was established.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Bound explicitly on the resource.
    Direct,
    /// Propagated from a project-level grant.
    Inherited,
}

/// Identity of a fact, independent of its origin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey {
    /// Principal identifier.
    pub principal: String,
    /// Resource key.
    pub resource: CanonicalKey,
    /// Role name.
    pub role: String,
}

/// A principal holding a role on a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessFact {
    /// Principal holding the role.
    pub principal: Principal,
    /// Resource the role applies to.
    pub resource: CanonicalKey,
    /// Role name.
    pub role: String,
    /// Direct or inherited.
    pub origin: Origin,
}

impl AccessFact {
    /// Create a direct fact.
    pub fn direct(principal: Principal, resource: CanonicalKey, role: impl Into<String>) -> Self {
        Self {
            principal,
            resource,
            role: role.into(),
            origin: Origin::Direct,
        }
    }

    /// Create an inherited fact.
    pub fn inherited(
        principal: Principal,
        resource: CanonicalKey,
        role: impl Into<String>,
    ) -> Self {
        Self {
            principal,
            resource,
            role: role.into(),
            origin: Origin::Inherited,
        }
    }

    /// Get the fact's identity.
    pub fn key(&self) -> FactKey {
        FactKey {
            principal: self.principal.identifier.clone(),
            resource: self.resource.clone(),
            role: self.role.clone(),
        }
    }
}

/// Deduplicated facts of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    facts: BTreeMap<FactKey, AccessFact>,
}

impl FactSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a direct fact. Returns `true` if no direct fact existed yet.
    ///
    /// A direct fact replaces an inherited fact with the same key.
    pub fn record_direct(
        &mut self,
        principal: Principal,
        resource: CanonicalKey,
        role: impl Into<String>,
    ) -> bool {
        let fact = AccessFact::direct(principal, resource, role);
        match self.facts.insert(fact.key(), fact) {
            Some(previous) => previous.origin != Origin::Direct,
            None => true,
        }
    }

    /// Record an inherited fact unless any fact with the same key exists.
    /// Returns `true` if it was added.
    pub fn record_inherited(&mut self, fact: AccessFact) -> bool {
        debug_assert_eq!(fact.origin, Origin::Inherited);
        let key = fact.key();
        if self.facts.contains_key(&key) {
            return false;
        }
        self.facts.insert(key, fact);
        true
    }

    /// Whether a direct fact exists for this key.
    pub fn has_direct(&self, key: &FactKey) -> bool {
        self.facts
            .get(key)
            .is_some_and(|fact| fact.origin == Origin::Direct)
    }

    /// Get a fact by key.
    pub fn get(&self, key: &FactKey) -> Option<&AccessFact> {
        self.facts.get(key)
    }

    /// Direct facts bound on `resource`.
    pub fn direct_on<'a>(
        &'a self,
        resource: &'a CanonicalKey,
    ) -> impl Iterator<Item = &'a AccessFact> + 'a {
        self.facts
            .values()
            .filter(move |fact| fact.origin == Origin::Direct && &fact.resource == resource)
    }

    /// Iterate facts in `(principal, resource, role)` order.
    pub fn iter(&self) -> impl Iterator<Item = &AccessFact> {
        self.facts.values()
    }

    /// Number of facts.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Number of facts with the given origin.
    pub fn count(&self, origin: Origin) -> usize {
        self.facts.values().filter(|f| f.origin == origin).count()
    }
}
