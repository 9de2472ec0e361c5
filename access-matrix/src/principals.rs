//! Principal registry
//!
//! Principals are unique by identifier and created the first time they are
//! observed, either in the project directory or in the policy stream.

use access_model::Principal;
use std::collections::BTreeMap;

/// The principals of one aggregation pass, ordered by identifier.
#[derive(Debug, Clone, Default)]
pub struct PrincipalSet {
    principals: BTreeMap<String, Principal>,
}

impl PrincipalSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw member strings.
    pub fn from_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for member in members {
            set.observe(Principal::parse(member.as_ref()));
        }
        set
    }

    /// Record a principal. Returns `true` if its identifier was new.
    ///
    /// The first observation wins; later ones with the same identifier are
    /// ignored even if their kind differs.
    pub fn observe(&mut self, principal: Principal) -> bool {
        if self.principals.contains_key(&principal.identifier) {
            return false;
        }
        self.principals
            .insert(principal.identifier.clone(), principal);
        true
    }

    /// Whether an identifier is known.
    pub fn contains(&self, identifier: &str) -> bool {
        self.principals.contains_key(identifier)
    }

    /// Get a principal by identifier.
    pub fn get(&self, identifier: &str) -> Option<&Principal> {
        self.principals.get(identifier)
    }

    /// Number of distinct principals.
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    /// Iterate principals in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Principal> {
        self.principals.values()
    }

    /// Consume the set into an identifier-ordered vector.
    pub fn into_vec(self) -> Vec<Principal> {
        self.principals.into_values().collect()
    }
}
