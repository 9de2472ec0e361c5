//! # Principals
//!
//! Typed identities parsed from IAM member strings such as
//! `user:alice@example.com` or `serviceAccount:ci@p.iam.gserviceaccount.com`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of identity that can hold a role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// A human user account (`user:`).
    IndividualUser,
    /// A service account or other workload identity (`serviceAccount:`).
    WorkloadIdentity,
    /// A group of accounts (`group:`).
    Group,
    /// Every account in a domain (`domain:`).
    Domain,
    /// Anything else (`allUsers`, `principalSet://...`, `deleted:...`).
    Other,
}

/// Member prefixes and the kind they map to.
///
/// Matching is case-sensitive on the exact prefix.
const MEMBER_PREFIXES: &[(&str, PrincipalKind)] = &[
    ("user:", PrincipalKind::IndividualUser),
    ("serviceAccount:", PrincipalKind::WorkloadIdentity),
    ("group:", PrincipalKind::Group),
    ("domain:", PrincipalKind::Domain),
];

impl PrincipalKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::IndividualUser => "individual_user",
            PrincipalKind::WorkloadIdentity => "workload_identity",
            PrincipalKind::Group => "group",
            PrincipalKind::Domain => "domain",
            PrincipalKind::Other => "other",
        }
    }

    /// Get the IAM member prefix for this kind, if it has one.
    pub fn member_prefix(&self) -> Option<&'static str> {
        MEMBER_PREFIXES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(prefix, _)| *prefix)
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identity observed in the project directory or the policy stream.
///
/// Principals are unique by `identifier`. Field order makes the derived
/// ordering sort by identifier first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal {
    /// Identifier with the member prefix stripped (usually an email).
    pub identifier: String,
    /// Kind derived from the member prefix.
    pub kind: PrincipalKind,
}

impl Principal {
    /// Create a principal from its parts.
    pub fn new(identifier: impl Into<String>, kind: PrincipalKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
        }
    }

    /// Parse a raw IAM member string.
    ///
    /// Total over all strings: unknown prefixes, and a known prefix with
    /// nothing after it, become [`PrincipalKind::Other`] carrying the raw
    /// string as identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use access_model::principal::{Principal, PrincipalKind};
    ///
    /// let p = Principal::parse("group:admins@example.com");
    /// assert_eq!(p.identifier, "admins@example.com");
    /// assert_eq!(p.kind, PrincipalKind::Group);
    ///
    /// let p = Principal::parse("allUsers");
    /// assert_eq!(p.identifier, "allUsers");
    /// assert_eq!(p.kind, PrincipalKind::Other);
    /// ```
    pub fn parse(member: &str) -> Self {
        MEMBER_PREFIXES
            .iter()
            .find_map(|(prefix, kind)| {
                member
                    .strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| Self::new(rest, *kind))
            })
            .unwrap_or_else(|| Self::new(member, PrincipalKind::Other))
    }

    /// Rebuild the IAM member string this principal was parsed from.
    pub fn member(&self) -> String {
        match self.kind.member_prefix() {
            Some(prefix) => format!("{}{}", prefix, self.identifier),
            None => self.identifier.clone(),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_prefixes() {
        let p = Principal::parse("user:alice@example.com");
        assert_eq!(p, Principal::new("alice@example.com", PrincipalKind::IndividualUser));

        let p = Principal::parse("serviceAccount:ci@proj.iam.gserviceaccount.com");
        assert_eq!(p.identifier, "ci@proj.iam.gserviceaccount.com");
        assert_eq!(p.kind, PrincipalKind::WorkloadIdentity);

        let p = Principal::parse("group:ops@example.com");
        assert_eq!(p.kind, PrincipalKind::Group);

        let p = Principal::parse("domain:example.com");
        assert_eq!(p.identifier, "example.com");
        assert_eq!(p.kind, PrincipalKind::Domain);
    }

    #[test]
    fn test_parse_unknown_prefix_keeps_raw_string() {
        let p = Principal::parse("principalSet://goog/public:all");
        assert_eq!(p.identifier, "principalSet://goog/public:all");
        assert_eq!(p.kind, PrincipalKind::Other);

        let p = Principal::parse("deleted:user:bob@example.com?uid=1");
        assert_eq!(p.kind, PrincipalKind::Other);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let p = Principal::parse("User:alice@example.com");
        assert_eq!(p.kind, PrincipalKind::Other);
        assert_eq!(p.identifier, "User:alice@example.com");
    }

    #[test]
    fn test_bare_prefix_is_other() {
        let p = Principal::parse("user:");
        assert_eq!(p.kind, PrincipalKind::Other);
        assert_eq!(p.identifier, "user:");

        let p = Principal::parse("");
        assert_eq!(p.kind, PrincipalKind::Other);
        assert_eq!(p.identifier, "");
    }

    #[test]
    fn test_member_round_trip() {
        for raw in ["user:a@x.com", "serviceAccount:sa@x.com", "group:g@x.com", "allUsers"] {
            assert_eq!(Principal::parse(raw).member(), raw);
        }
    }

    #[test]
    fn test_ordering_by_identifier() {
        let mut principals = vec![
            Principal::parse("user:zed@example.com"),
            Principal::parse("group:admins@example.com"),
        ];
        principals.sort();
        assert_eq!(principals[0].identifier, "admins@example.com");
    }
}
