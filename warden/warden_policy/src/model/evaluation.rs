//! Rule evaluation results.

use serde::{Deserialize, Serialize};
use std::fmt;

use warden_core::error::AuthError;
use warden_core::id::{AccountType, PrincipalKey};

use crate::model::Leaf;

/// The outcome of evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Whether the rule allowed.
    pub allowed: bool,

    /// The leaf responsible for a denial. `None` when the rule allowed or
    /// when a `Not` node denied.
    pub failed_leaf: Option<Leaf>,

    /// Whether the failed leaf could not be checked because the request had
    /// no live session for its account type.
    #[serde(default)]
    pub unauthenticated: bool,

    /// The first principal resolved during evaluation.
    #[serde(default)]
    pub principal: Option<PrincipalKey>,
}

impl EvalResult {
    /// An allowing result.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            failed_leaf: None,
            unauthenticated: false,
            principal: None,
        }
    }

    /// A denial caused by a leaf that evaluated to false.
    pub fn deny(leaf: Leaf) -> Self {
        Self {
            allowed: false,
            failed_leaf: Some(leaf),
            unauthenticated: false,
            principal: None,
        }
    }

    /// A denial caused by a leaf that needed a session the request lacked.
    pub fn deny_unauthenticated(leaf: Leaf) -> Self {
        Self {
            unauthenticated: true,
            ..Self::deny(leaf)
        }
    }

    /// A denial produced by a `Not` node.
    pub fn negated() -> Self {
        Self {
            allowed: false,
            failed_leaf: None,
            unauthenticated: false,
            principal: None,
        }
    }

    /// Attach the principal the evaluation acted on.
    pub fn with_principal(mut self, principal: Option<PrincipalKey>) -> Self {
        self.principal = principal;
        self
    }

    /// The error a guard raises for this result, or `None` if it allowed.
    pub fn to_error(&self) -> Option<AuthError> {
        if self.allowed {
            return None;
        }

        let error = match &self.failed_leaf {
            None => AuthError::Negated,
            Some(leaf) if self.unauthenticated => AuthError::NotLoggedIn {
                account_type: leaf.account_type().cloned().unwrap_or_else(AccountType::default),
            },
            Some(leaf) => leaf.denial(),
        };
        Some(error)
    }

    /// Convert into a guard outcome.
    pub fn into_result(self) -> Result<(), AuthError> {
        match self.to_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl fmt::Display for EvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allowed {
            return f.write_str("ALLOW");
        }
        match &self.failed_leaf {
            Some(leaf) if self.unauthenticated => write!(f, "DENY {} (not logged in)", leaf),
            Some(leaf) => write!(f, "DENY {}", leaf),
            None => f.write_str("DENY (negated)"),
        }
    }
}
