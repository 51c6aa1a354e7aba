//! Session storage.
//!
//! This module defines the [`SessionStore`] contract and provides the
//! sharded in-memory implementation, [`InMemorySessionStore`].
//!
//! Expiry is evaluated lazily on every read: an expired session is simply
//! reported as absent. Removing dead entries is the job of
//! [`SessionStore::purge_expired`], normally driven by the
//! [`Reaper`](crate::Reaper).

mod in_memory;

pub use in_memory::InMemorySessionStore;

use std::time::Duration;

use warden_core::error::SessionError;
use warden_core::id::{PrincipalKey, Token};
use warden_core::types::{Principal, Session};
use warden_core::utils::{TokenStyle, WardenConfig};

/// Login policy applied by a session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    /// How tokens are generated.
    pub token_style: TokenStyle,

    /// Sessions idle for this long resolve as expired.
    pub idle_timeout: Option<Duration>,

    /// Whether one principal may hold several sessions. When `false`, a new
    /// login replaces every previous session of the principal.
    pub concurrent_login: bool,

    /// Upper bound on sessions per principal; the oldest are evicted.
    pub max_sessions_per_principal: Option<usize>,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            token_style: TokenStyle::default(),
            idle_timeout: None,
            concurrent_login: true,
            max_sessions_per_principal: None,
        }
    }
}

impl SessionPolicy {
    /// Derive the policy from a configuration.
    pub fn from_config(config: &WardenConfig) -> Self {
        Self {
            token_style: config.token_style,
            idle_timeout: config.idle_timeout(),
            concurrent_login: config.concurrent_login,
            max_sessions_per_principal: config.max_sessions_per_principal,
        }
    }

    /// The effective per-principal session cap.
    pub fn session_cap(&self) -> Option<usize> {
        if self.concurrent_login {
            self.max_sessions_per_principal
        } else {
            Some(1)
        }
    }
}

/// Trait for session storage.
///
/// Absence is never an error: unknown or expired tokens yield `None`,
/// `false` or an empty list. Implementations must allow concurrent reads and
/// writes, and a write on one token must not block reads of unrelated tokens.
pub trait SessionStore: Send + Sync {
    /// Create a session for a principal.
    ///
    /// # Arguments
    ///
    /// * `principal` - The subject logging in.
    /// * `ttl` - Session lifetime; `None` keeps it until explicit logout.
    ///
    /// # Returns
    ///
    /// * `Ok(Token)` - The token bound to the new session.
    /// * `Err(SessionError::InvalidPrincipal)` - If the principal is unusable.
    fn create(&self, principal: Principal, ttl: Option<Duration>) -> Result<Token, SessionError>;

    /// Look up a session, reporting why the lookup failed.
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - A snapshot of the live session.
    /// * `Err(SessionError::TokenNotFound)` - If the token is unknown.
    /// * `Err(SessionError::SessionExpired)` - If the session expired or idled out.
    fn lookup(&self, token: &Token) -> Result<Session, SessionError>;

    /// Resolve a token to a live session.
    fn resolve(&self, token: &Token) -> Option<Session> {
        self.lookup(token).ok()
    }

    /// Record activity on a session. Returns `false` if the token is not live.
    fn touch(&self, token: &Token) -> bool;

    /// Reset a session's lifetime. Returns `false` if the token is not live.
    fn renew(&self, token: &Token, ttl: Option<Duration>) -> bool;

    /// Destroy one session (logout).
    fn destroy(&self, token: &Token) -> Option<Session>;

    /// Destroy every session of a principal (kick). Returns how many were removed.
    fn destroy_all_for(&self, principal: &PrincipalKey) -> usize;

    /// List the live sessions of a principal, oldest first.
    fn sessions_for(&self, principal: &PrincipalKey) -> Vec<Session>;

    /// List the tokens of a principal's live sessions, oldest first.
    fn tokens_for(&self, principal: &PrincipalKey) -> Vec<Token> {
        self.sessions_for(principal)
            .into_iter()
            .map(|session| session.token)
            .collect()
    }

    /// Get an attribute of a live session.
    fn attribute(&self, token: &Token, key: &str) -> Option<serde_json::Value> {
        self.resolve(token)
            .and_then(|session| session.attributes.get(key).cloned())
    }

    /// Set an attribute on a live session. Returns `false` if the token is not live.
    fn set_attribute(&self, token: &Token, key: String, value: serde_json::Value) -> bool;

    /// Remove an attribute from a session.
    fn remove_attribute(&self, token: &Token, key: &str) -> Option<serde_json::Value>;

    /// Remove expired and idle sessions. Returns how many were removed.
    fn purge_expired(&self) -> usize;

    /// Number of stored sessions, including expired ones not yet purged.
    fn len(&self) -> usize;

    /// Check if the store holds no sessions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_config() {
        let config = WardenConfig {
            idle_timeout_secs: Some(30),
            concurrent_login: false,
            ..WardenConfig::default()
        };
        let policy = SessionPolicy::from_config(&config);

        assert_eq!(policy.idle_timeout, Some(Duration::from_secs(30)));
        assert!(!policy.concurrent_login);
        assert_eq!(policy.session_cap(), Some(1));
    }

    #[test]
    fn test_session_cap() {
        let policy = SessionPolicy::default();
        assert_eq!(policy.session_cap(), None);

        let policy = SessionPolicy {
            max_sessions_per_principal: Some(3),
            ..SessionPolicy::default()
        };
        assert_eq!(policy.session_cap(), Some(3));
    }
}
