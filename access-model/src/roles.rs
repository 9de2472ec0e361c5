//! # Role Applicability
//!
//! Decides which child resource kinds a project-level role cascades to.
//! Basic roles reach every kind; service roles (`roles/compute.*`) reach the
//! kind their service owns; everything else stays on the project.

use crate::resources::ResourceKind;

/// Resource kinds a project-level role applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScope {
    /// Applies to every kind.
    AllKinds,
    /// Applies to the listed kinds only.
    Kinds(&'static [ResourceKind]),
    /// Does not cascade below the project.
    NoCascade,
}

/// How a rule matches a role name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePattern {
    /// The role name must equal this string.
    Exact(&'static str),
    /// The role name must start with this string.
    Prefix(&'static str),
}

impl RolePattern {
    fn matches(&self, role: &str) -> bool {
        match self {
            RolePattern::Exact(name) => role == *name,
            RolePattern::Prefix(prefix) => role.starts_with(prefix),
        }
    }
}

/// One row of the applicability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRule {
    /// Which roles the row covers.
    pub pattern: RolePattern,
    /// Where those roles cascade.
    pub scope: RoleScope,
}

const fn rule(pattern: RolePattern, scope: RoleScope) -> RoleRule {
    RoleRule { pattern, scope }
}

/// Role applicability table. Roles matching no row do not cascade.
pub const ROLE_RULES: &[RoleRule] = &[
    rule(RolePattern::Exact("roles/owner"), RoleScope::AllKinds),
    rule(RolePattern::Exact("roles/editor"), RoleScope::AllKinds),
    rule(RolePattern::Exact("roles/viewer"), RoleScope::AllKinds),
    rule(
        RolePattern::Prefix("roles/storage."),
        RoleScope::Kinds(&[ResourceKind::Storage]),
    ),
    rule(
        RolePattern::Prefix("roles/compute."),
        RoleScope::Kinds(&[ResourceKind::Vm]),
    ),
    rule(
        RolePattern::Prefix("roles/container."),
        RoleScope::Kinds(&[ResourceKind::Cluster]),
    ),
    rule(
        RolePattern::Prefix("roles/run."),
        RoleScope::Kinds(&[ResourceKind::ManagedService]),
    ),
    rule(
        RolePattern::Prefix("roles/bigquery."),
        RoleScope::Kinds(&[ResourceKind::Warehouse]),
    ),
    rule(
        RolePattern::Prefix("roles/iam."),
        RoleScope::Kinds(&[ResourceKind::WorkloadIdentityAccount]),
    ),
];

impl RoleScope {
    /// Look up the scope of a role in [`ROLE_RULES`].
    ///
    /// # Example
    ///
    /// ```
    /// use access_model::resources::ResourceKind;
    /// use access_model::roles::RoleScope;
    ///
    /// assert_eq!(RoleScope::for_role("roles/owner"), RoleScope::AllKinds);
    /// assert!(RoleScope::for_role("roles/run.invoker").applies_to(ResourceKind::ManagedService));
    /// assert_eq!(RoleScope::for_role("roles/pubsub.publisher"), RoleScope::NoCascade);
    /// ```
    pub fn for_role(role: &str) -> Self {
        ROLE_RULES
            .iter()
            .find(|rule| rule.pattern.matches(role))
            .map(|rule| rule.scope)
            .unwrap_or(RoleScope::NoCascade)
    }

    /// Check whether this scope covers a resource kind.
    pub fn applies_to(&self, kind: ResourceKind) -> bool {
        match self {
            RoleScope::AllKinds => true,
            RoleScope::Kinds(kinds) => kinds.contains(&kind),
            RoleScope::NoCascade => false,
        }
    }

    /// Check whether the role cascades to anything at all.
    pub fn cascades(&self) -> bool {
        !matches!(self, RoleScope::NoCascade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_roles_apply_everywhere() {
        for role in ["roles/owner", "roles/editor", "roles/viewer"] {
            let scope = RoleScope::for_role(role);
            for kind in ResourceKind::all() {
                assert!(scope.applies_to(kind), "{role} on {kind}");
            }
        }
    }

    #[test]
    fn test_service_roles_apply_to_their_kind_only() {
        let cases = [
            ("roles/storage.objectViewer", ResourceKind::Storage),
            ("roles/compute.instanceAdmin.v1", ResourceKind::Vm),
            ("roles/container.developer", ResourceKind::Cluster),
            ("roles/run.invoker", ResourceKind::ManagedService),
            ("roles/bigquery.dataViewer", ResourceKind::Warehouse),
            ("roles/iam.serviceAccountUser", ResourceKind::WorkloadIdentityAccount),
        ];

        for (role, kind) in cases {
            let scope = RoleScope::for_role(role);
            for other in ResourceKind::all() {
                assert_eq!(scope.applies_to(other), other == kind, "{role} on {other}");
            }
        }
    }

    #[test]
    fn test_unlisted_roles_do_not_cascade() {
        for role in ["roles/pubsub.publisher", "roles/logging.viewer", "projects/p/roles/custom"] {
            let scope = RoleScope::for_role(role);
            assert!(!scope.cascades(), "{role}");
            assert!(!scope.applies_to(ResourceKind::Vm));
        }
    }

    #[test]
    fn test_basic_roles_match_exactly() {
        assert_eq!(RoleScope::for_role("roles/viewerExtended"), RoleScope::NoCascade);
        assert_eq!(RoleScope::for_role("roles/storage"), RoleScope::NoCascade);
    }
}
