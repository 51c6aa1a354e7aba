//! Identifier types for the Warden authorization core.
//!
//! Every per-principal record in Warden (sessions, safe zones, bans) is keyed
//! by a [`PrincipalKey`], the pair of an [`AccountType`] and an opaque
//! caller-supplied id. Two keys with the same id but different account types
//! are unrelated.
//!
//! # Examples
//!
//! ```
//! use warden_core::id::{AccountType, PrincipalKey};
//!
//! let staff = PrincipalKey::new(AccountType::new("staff"), "U1");
//! let customer = PrincipalKey::new(AccountType::new("customer"), "U1");
//!
//! assert_ne!(staff, customer);
//! assert_eq!(staff.to_string(), "staff:U1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The account type used when a caller does not name one.
pub const DEFAULT_ACCOUNT_TYPE: &str = "login";

/// The safe-zone scope used when a caller does not name one.
pub const GLOBAL_SCOPE: &str = "__global__";

/// A namespace distinguishing independent login systems, e.g. `"staff"` and
/// `"customer"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountType(String);

impl AccountType {
    /// Create an account type from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the account type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the default account type.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_ACCOUNT_TYPE
    }
}

impl Default for AccountType {
    fn default() -> Self {
        Self(DEFAULT_ACCOUNT_TYPE.to_string())
    }
}

impl From<&str> for AccountType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AccountType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uniquely identifies a logical subject across all sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalKey {
    /// The login system this subject belongs to.
    pub account_type: AccountType,

    /// The caller-supplied identifier within that login system.
    pub id: String,
}

impl PrincipalKey {
    /// Create a new principal key.
    pub fn new(account_type: AccountType, id: impl Into<String>) -> Self {
        Self {
            account_type,
            id: id.into(),
        }
    }

    /// Create a principal key under the default account type.
    pub fn with_default_account(id: impl Into<String>) -> Self {
        Self::new(AccountType::default(), id)
    }
}

impl fmt::Display for PrincipalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account_type, self.id)
    }
}

/// An opaque session token.
///
/// Tokens are bearer secrets. [`Token::redacted`] should be used whenever a
/// token ends up in a log line.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a token string received from the transport layer.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short, log-safe prefix of the token.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_account_type() {
        let account = AccountType::default();
        assert_eq!(account.as_str(), DEFAULT_ACCOUNT_TYPE);
        assert!(account.is_default());
        assert!(!AccountType::new("staff").is_default());
    }

    #[test]
    fn test_principal_keys_isolated_by_account_type() {
        let staff = PrincipalKey::new("staff".into(), "U1");
        let customer = PrincipalKey::new("customer".into(), "U1");

        let mut keys = HashSet::new();
        keys.insert(staff.clone());
        keys.insert(customer.clone());
        assert_eq!(keys.len(), 2);
        assert_ne!(staff, customer);
    }

    #[test]
    fn test_token_redaction() {
        let token = Token::new("abcdefghijklmnop");
        assert_eq!(token.redacted(), "abcdef…");
        assert!(!format!("{:?}", token).contains("ghij"));
        assert_eq!(token.to_string(), "abcdefghijklmnop");
    }

    #[test]
    fn test_account_type_serializes_as_string() {
        let key = PrincipalKey::with_default_account("U1");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"account_type":"login","id":"U1"}"#);
    }
}
