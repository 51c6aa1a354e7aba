//! Role and permission snapshots.
//!
//! A [`Grants`] value is what a resolver returns for one principal at one
//! point in time. Permission codes support two wildcard forms:
//!
//! | Code | Matches |
//! |------|---------|
//! | `*` | every permission |
//! | `user.*` | `user.add`, `user.profile.edit`, ... |
//! | `user.add` | exactly `user.add` |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The universal wildcard for roles and permissions.
pub const WILDCARD: &str = "*";

/// A snapshot of the roles and permissions held by a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    /// Role names.
    #[serde(default)]
    pub roles: HashSet<String>,

    /// Permission codes.
    #[serde(default)]
    pub permissions: HashSet<String>,
}

impl Grants {
    /// Create a snapshot from role and permission lists.
    pub fn new<R, P>(roles: R, permissions: P) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty snapshot.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if the snapshot holds a role, directly or through `*`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role) || self.roles.contains(WILDCARD)
    }

    /// Check if any held permission code matches `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
            || self
                .permissions
                .iter()
                .any(|pattern| permission_matches(pattern, permission))
    }
}

/// Check if a held permission code grants the requested permission.
///
/// ```
/// use warden_core::types::permission_matches;
///
/// assert!(permission_matches("*", "anything"));
/// assert!(permission_matches("user.*", "user.add"));
/// assert!(!permission_matches("user.*", "order.add"));
/// assert!(!permission_matches("user.*", "user"));
/// ```
pub fn permission_matches(pattern: &str, permission: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    match pattern.strip_suffix(".*") {
        Some(prefix) => permission
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1),
        None => pattern == permission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_wildcard_permission() {
        let grants = Grants::new(Vec::<String>::new(), ["*"]);
        for code in ["user.add", "order.delete", "", "x"] {
            assert!(grants.has_permission(code), "{code} should match *");
        }
    }

    #[test]
    fn test_prefix_wildcard_permission() {
        let grants = Grants::new(Vec::<String>::new(), ["user.*"]);
        assert!(grants.has_permission("user.add"));
        assert!(grants.has_permission("user.delete"));
        assert!(grants.has_permission("user.profile.edit"));
        assert!(!grants.has_permission("order.add"));
        assert!(!grants.has_permission("user"));
        assert!(!grants.has_permission("username.add"));
    }

    #[test]
    fn test_exact_permission() {
        let grants = Grants::new(["admin"], ["user.add", "user.update"]);
        assert!(grants.has_permission("user.add"));
        assert!(!grants.has_permission("user.delete"));
    }

    #[test]
    fn test_role_wildcard() {
        let grants = Grants::new(["*"], Vec::<String>::new());
        assert!(grants.has_role("admin"));
        assert!(grants.has_role("auditor"));

        let grants = Grants::new(["admin"], Vec::<String>::new());
        assert!(grants.has_role("admin"));
        assert!(!grants.has_role("auditor"));
    }
}
