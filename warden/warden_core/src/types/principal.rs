//! Principal model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;
use crate::id::{AccountType, PrincipalKey};

/// A logged-in subject.
///
/// A principal is identified by its [`PrincipalKey`]. The optional device
/// tag records where the login came from (e.g. `"pc"`, `"app"`) and has no
/// influence on authorization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    key: PrincipalKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    device: Option<String>,
}

impl Principal {
    /// Create a principal for the given account type.
    pub fn new(account_type: impl Into<AccountType>, id: impl Into<String>) -> Self {
        Self {
            key: PrincipalKey::new(account_type.into(), id),
            device: None,
        }
    }

    /// Create a principal under the default account type.
    pub fn with_default_account(id: impl Into<String>) -> Self {
        Self {
            key: PrincipalKey::with_default_account(id),
            device: None,
        }
    }

    /// Tag the principal with the device it logged in from.
    pub fn on_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Get the caller-supplied identifier.
    pub fn id(&self) -> &str {
        &self.key.id
    }

    /// Get the account type.
    pub fn account_type(&self) -> &AccountType {
        &self.key.account_type
    }

    /// Get the key that identifies this principal.
    pub fn key(&self) -> &PrincipalKey {
        &self.key
    }

    /// Get the login device tag, if any.
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Check that the principal can own a session.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.key.id.trim().is_empty() {
            return Err(SessionError::InvalidPrincipal(
                "principal id cannot be empty".to_string(),
            ));
        }
        if self.key.account_type.as_str().trim().is_empty() {
            return Err(SessionError::InvalidPrincipal(
                "account type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<PrincipalKey> for Principal {
    fn from(key: PrincipalKey) -> Self {
        Self { key, device: None }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device {
            Some(device) => write!(f, "{}@{}", self.key, device),
            None => write!(f, "{}", self.key),
        }
    }
}
