//! Rule expressions.
//!
//! A [`Rule`] is an immutable tree of [`Leaf`] checks combined with `All`
//! (AND), `Any` (OR) and `Not`, plus the [`Rule::Bypass`] marker which
//! unconditionally permits.
//!
//! Rules serialize to a compact JSON/TOML form:
//!
//! ```json
//! {"all": [
//!     {"check": "is_logged_in"},
//!     {"any": [
//!         {"check": "has_permission", "permission": "user.add"},
//!         {"check": "has_role", "role": "admin"}
//!     ]}
//! ]}
//! ```
//!
//! # Examples
//!
//! ```
//! use warden_policy::model::Rule;
//!
//! let rule = Rule::all([
//!     Rule::logged_in(),
//!     Rule::permission_or_roles("user.add", ["admin", "super-admin"]),
//! ]);
//!
//! assert!(rule.needs_grants());
//! assert!(!rule.contains_bypass());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use warden_core::error::AuthError;
use warden_core::id::{AccountType, GLOBAL_SCOPE};
use warden_core::types::{BasicCredentials, DigestExpectation};

fn global_scope() -> String {
    GLOBAL_SCOPE.to_string()
}

/// A single authorization check.
///
/// Every principal-scoped check names the account type it applies to, so one
/// rule may mix checks against several login systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Leaf {
    /// A live session exists for the account type.
    IsLoggedIn {
        /// The account type to check.
        #[serde(default, skip_serializing_if = "AccountType::is_default")]
        account: AccountType,
    },

    /// The principal holds a role.
    HasRole {
        /// The role name.
        role: String,

        /// The account type to check.
        #[serde(default, skip_serializing_if = "AccountType::is_default")]
        account: AccountType,
    },

    /// The principal holds a permission.
    HasPermission {
        /// The permission code.
        permission: String,

        /// The account type to check.
        #[serde(default, skip_serializing_if = "AccountType::is_default")]
        account: AccountType,
    },

    /// The principal has an open safe zone for the scope.
    IsSafe {
        /// The safe-zone scope.
        #[serde(default = "global_scope")]
        scope: String,

        /// The account type to check.
        #[serde(default, skip_serializing_if = "AccountType::is_default")]
        account: AccountType,
    },

    /// The principal is not banned from the service.
    IsNotBanned {
        /// The service key.
        service: String,

        /// The account type to check.
        #[serde(default, skip_serializing_if = "AccountType::is_default")]
        account: AccountType,
    },

    /// The request carries matching Basic credentials.
    HttpBasic {
        /// The credentials the request must carry.
        expected: BasicCredentials,
    },

    /// The request carries a Digest response computed with the expected
    /// credentials.
    HttpDigest {
        /// The credentials the response must have been computed with.
        expected: DigestExpectation,
    },
}

impl Leaf {
    /// Get the account type a principal-scoped check applies to.
    ///
    /// Transport credential checks return `None`.
    pub fn account_type(&self) -> Option<&AccountType> {
        match self {
            Self::IsLoggedIn { account }
            | Self::HasRole { account, .. }
            | Self::HasPermission { account, .. }
            | Self::IsSafe { account, .. }
            | Self::IsNotBanned { account, .. } => Some(account),
            Self::HttpBasic { .. } | Self::HttpDigest { .. } => None,
        }
    }

    /// Check if this leaf consults the role/permission resolver.
    pub fn needs_grants(&self) -> bool {
        matches!(self, Self::HasRole { .. } | Self::HasPermission { .. })
    }

    /// The denial reported when this leaf fails.
    pub fn denial(&self) -> AuthError {
        match self {
            Self::IsLoggedIn { account } => AuthError::NotLoggedIn {
                account_type: account.clone(),
            },
            Self::HasRole { role, .. } => AuthError::MissingRole { role: role.clone() },
            Self::HasPermission { permission, .. } => AuthError::MissingPermission {
                permission: permission.clone(),
            },
            Self::IsSafe { scope, .. } => AuthError::NotElevated {
                scope: scope.clone(),
            },
            Self::IsNotBanned { service, .. } => AuthError::ServiceBanned {
                service: service.clone(),
            },
            Self::HttpBasic { .. } | Self::HttpDigest { .. } => AuthError::BadCredentials,
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsLoggedIn { account } => write!(f, "is_logged_in[{}]", account),
            Self::HasRole { role, account } => write!(f, "has_role({})[{}]", role, account),
            Self::HasPermission {
                permission,
                account,
            } => write!(f, "has_permission({})[{}]", permission, account),
            Self::IsSafe { scope, account } => write!(f, "is_safe({})[{}]", scope, account),
            Self::IsNotBanned { service, account } => {
                write!(f, "is_not_banned({})[{}]", service, account)
            }
            Self::HttpBasic { expected } => write!(f, "http_basic({})", expected.username),
            Self::HttpDigest { expected } => {
                write!(f, "http_digest({}@{})", expected.username, expected.realm)
            }
        }
    }
}

/// An authorization rule expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Allow unconditionally, overriding every other check in the tree.
    Bypass,

    /// Allow iff every child allows. An empty list allows.
    All(Vec<Rule>),

    /// Allow iff some child allows. An empty list allows.
    Any(Vec<Rule>),

    /// Allow iff the inner rule denies.
    Not(Box<Rule>),

    /// A single check.
    #[serde(untagged)]
    Leaf(Leaf),
}

impl Rule {
    /// The bypass marker.
    pub fn bypass() -> Self {
        Self::Bypass
    }

    /// Combine rules with AND.
    pub fn all(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self::All(rules.into_iter().collect())
    }

    /// Combine rules with OR.
    pub fn any(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self::Any(rules.into_iter().collect())
    }

    /// Negate a rule.
    #[allow(clippy::should_implement_trait)]
    pub fn not(rule: Rule) -> Self {
        Self::Not(Box::new(rule))
    }

    /// Require a session under the default account type.
    pub fn logged_in() -> Self {
        Self::logged_in_as(AccountType::default())
    }

    /// Require a session under the given account type.
    pub fn logged_in_as(account: impl Into<AccountType>) -> Self {
        Self::Leaf(Leaf::IsLoggedIn {
            account: account.into(),
        })
    }

    /// Require a role under the default account type.
    pub fn role(role: impl Into<String>) -> Self {
        Self::role_in(AccountType::default(), role)
    }

    /// Require a role under the given account type.
    pub fn role_in(account: impl Into<AccountType>, role: impl Into<String>) -> Self {
        Self::Leaf(Leaf::HasRole {
            role: role.into(),
            account: account.into(),
        })
    }

    /// Require a permission under the default account type.
    pub fn permission(permission: impl Into<String>) -> Self {
        Self::permission_in(AccountType::default(), permission)
    }

    /// Require a permission under the given account type.
    pub fn permission_in(account: impl Into<AccountType>, permission: impl Into<String>) -> Self {
        Self::Leaf(Leaf::HasPermission {
            permission: permission.into(),
            account: account.into(),
        })
    }

    /// Require an open safe zone for the global scope.
    pub fn safe() -> Self {
        Self::safe_for(GLOBAL_SCOPE)
    }

    /// Require an open safe zone for a scope.
    pub fn safe_for(scope: impl Into<String>) -> Self {
        Self::safe_in(AccountType::default(), scope)
    }

    /// Require an open safe zone for a scope under the given account type.
    pub fn safe_in(account: impl Into<AccountType>, scope: impl Into<String>) -> Self {
        Self::Leaf(Leaf::IsSafe {
            scope: scope.into(),
            account: account.into(),
        })
    }

    /// Require that the principal is not banned from a service.
    pub fn not_banned(service: impl Into<String>) -> Self {
        Self::not_banned_in(AccountType::default(), service)
    }

    /// Require that the principal is not banned from a service under the
    /// given account type.
    pub fn not_banned_in(account: impl Into<AccountType>, service: impl Into<String>) -> Self {
        Self::Leaf(Leaf::IsNotBanned {
            service: service.into(),
            account: account.into(),
        })
    }

    /// Require matching Basic credentials.
    pub fn http_basic(expected: BasicCredentials) -> Self {
        Self::Leaf(Leaf::HttpBasic { expected })
    }

    /// Require a Digest response computed with the expected credentials.
    pub fn http_digest(expected: DigestExpectation) -> Self {
        Self::Leaf(Leaf::HttpDigest { expected })
    }

    /// A permission check that any of the alternate roles also satisfies.
    ///
    /// Expands to `Any(HasPermission(p), HasRole(r1), HasRole(r2), ...)`.
    pub fn permission_or_roles<I>(permission: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut children = vec![Self::permission(permission)];
        children.extend(roles.into_iter().map(Self::role));
        Self::Any(children)
    }

    /// Require every listed role at once.
    pub fn all_roles<I>(roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::all(roles.into_iter().map(Self::role))
    }

    /// Require at least one of the listed roles.
    pub fn any_role<I>(roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::any(roles.into_iter().map(Self::role))
    }

    /// Check if a bypass marker appears anywhere in the tree.
    pub fn contains_bypass(&self) -> bool {
        match self {
            Self::Bypass => true,
            Self::All(children) | Self::Any(children) => {
                children.iter().any(Rule::contains_bypass)
            }
            Self::Not(inner) => inner.contains_bypass(),
            Self::Leaf(_) => false,
        }
    }

    /// Check if any leaf in the tree consults the role/permission resolver.
    pub fn needs_grants(&self) -> bool {
        self.leaves().iter().any(|leaf| leaf.needs_grants())
    }

    /// Collect the tree's leaves in evaluation order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            Self::Leaf(leaf) => out.push(leaf),
            Self::All(children) | Self::Any(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            Self::Not(inner) => inner.collect_leaves(out),
            Self::Bypass => {}
        }
    }
}

impl From<Leaf> for Rule {
    fn from(leaf: Leaf) -> Self {
        Self::Leaf(leaf)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, name: &str, children: &[Rule]) -> fmt::Result {
            write!(f, "{}(", name)?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", child)?;
            }
            f.write_str(")")
        }

        match self {
            Self::Bypass => f.write_str("bypass"),
            Self::All(children) => join(f, "all", children),
            Self::Any(children) => join(f, "any", children),
            Self::Not(inner) => write!(f, "not({})", inner),
            Self::Leaf(leaf) => write!(f, "{}", leaf),
        }
    }
}
