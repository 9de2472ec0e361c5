//! Resource registry
//!
//! Owns the resources of one aggregation pass, keyed by [`CanonicalKey`].
//! Inventory listings and the policy search stream both insert here; a key
//! maps to exactly one [`Resource`] and second arrivals merge into it.

use access_model::{CanonicalKey, Principal, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Location reported for resources known only from policy search.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Where a resource was first learned from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceOrigin {
    /// A typed inventory listing, with display metadata.
    Inventory,
    /// The policy search stream only.
    PolicySearch,
}

/// A cloud resource that can be the target of a grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// Canonical id, `<kind>/<name>`.
    pub canonical_id: String,
    /// Join key.
    #[serde(flatten)]
    pub key: CanonicalKey,
    /// Identifier as reported by the richest source.
    pub raw_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Region or zone, or [`UNKNOWN_LOCATION`].
    pub location: String,
    /// Every raw identifier seen for this resource.
    pub aliases: BTreeSet<String>,
    /// Grants bound directly on the resource: role -> principals.
    pub direct_grants: BTreeMap<String, BTreeSet<Principal>>,
    /// Source the display metadata came from.
    pub origin: ResourceOrigin,
}

impl Resource {
    /// Create a resource learned from an inventory listing.
    pub fn from_inventory(
        key: CanonicalKey,
        raw_id: impl Into<String>,
        location: Option<&str>,
    ) -> Self {
        Self::build(
            key,
            raw_id.into(),
            location.unwrap_or(UNKNOWN_LOCATION),
            ResourceOrigin::Inventory,
        )
    }

    /// Create a resource known only from policy search.
    pub fn discovered(key: CanonicalKey, raw_id: impl Into<String>) -> Self {
        Self::build(
            key,
            raw_id.into(),
            UNKNOWN_LOCATION,
            ResourceOrigin::PolicySearch,
        )
    }

    fn build(key: CanonicalKey, raw_id: String, location: &str, origin: ResourceOrigin) -> Self {
        Self {
            canonical_id: key.to_string(),
            display_name: key.name.clone(),
            aliases: BTreeSet::from([raw_id.clone()]),
            key,
            raw_id,
            location: location.to_string(),
            direct_grants: BTreeMap::new(),
            origin,
        }
    }

    /// Get the resource kind.
    pub fn kind(&self) -> ResourceKind {
        self.key.kind
    }

    /// Record a principal holding `role` directly on this resource.
    pub fn grant(&mut self, role: impl Into<String>, principal: Principal) -> bool {
        self.direct_grants
            .entry(role.into())
            .or_default()
            .insert(principal)
    }

    /// Merge another record of the same resource into this one.
    ///
    /// Inventory display metadata wins over policy search metadata; grants and
    /// aliases are unioned.
    pub fn merge(&mut self, other: Resource) {
        debug_assert_eq!(self.key, other.key);

        if other.origin == ResourceOrigin::Inventory && self.origin != ResourceOrigin::Inventory {
            self.raw_id = other.raw_id;
            self.display_name = other.display_name;
            self.location = other.location;
            self.origin = ResourceOrigin::Inventory;
        }

        self.aliases.extend(other.aliases);
        for (role, principals) in other.direct_grants {
            self.direct_grants.entry(role).or_default().extend(principals);
        }
    }
}

/// The resources of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    resources: BTreeMap<CanonicalKey, Resource>,
    aliases: HashMap<String, CanonicalKey>,
}

impl ResourceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Get a resource by key.
    pub fn get(&self, key: &CanonicalKey) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// Whether a key is tracked.
    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.resources.contains_key(key)
    }

    /// Iterate resources in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Resolve a raw identifier to its key.
    ///
    /// A raw id already registered as an alias resolves directly; anything
    /// else goes through [`CanonicalKey::from_identifier`].
    pub fn resolve(&self, raw: &str) -> CanonicalKey {
        self.aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| CanonicalKey::from_identifier(raw))
    }

    /// Insert a resource, merging it into any resource with the same key.
    pub fn insert(&mut self, resource: Resource) {
        for alias in &resource.aliases {
            self.aliases
                .entry(alias.clone())
                .or_insert_with(|| resource.key.clone());
        }

        match self.resources.get_mut(&resource.key) {
            Some(existing) => existing.merge(resource),
            None => {
                self.resources.insert(resource.key.clone(), resource);
            }
        }
    }

    /// Get the resource a policy search identifier refers to, creating it if
    /// no source has reported it yet.
    pub fn ensure_discovered(&mut self, raw: &str) -> &mut Resource {
        let key = self.resolve(raw);
        self.aliases
            .entry(raw.to_string())
            .or_insert_with(|| key.clone());

        let resource = self
            .resources
            .entry(key.clone())
            .or_insert_with(|| Resource::discovered(key, raw));
        resource.aliases.insert(raw.to_string());
        resource
    }

    /// Consume the set into a key-ordered vector.
    pub fn into_vec(self) -> Vec<Resource> {
        self.resources.into_values().collect()
    }
}
