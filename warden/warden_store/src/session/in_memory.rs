//! In-memory session store.
//!
//! This module provides a sharded, concurrent in-memory implementation of
//! the session store.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use warden_core::error::SessionError;
use warden_core::id::{PrincipalKey, Token};
use warden_core::types::{Principal, Session};

use super::{SessionPolicy, SessionStore};
use crate::token::TokenGenerator;

/// Attempts at drawing a token that is not already in use.
const MAX_TOKEN_ATTEMPTS: usize = 8;

/// An in-memory session store.
///
/// Sessions live in a token-keyed map; a second map indexes each principal's
/// tokens in creation order. When both maps are needed at once the principal
/// index is always locked first.
#[derive(Clone)]
pub struct InMemorySessionStore {
    /// The sessions, indexed by token.
    sessions: Arc<DashMap<Token, Session>>,

    /// Tokens of each principal, oldest first.
    by_principal: Arc<DashMap<PrincipalKey, Vec<Token>>>,

    /// Login policy.
    policy: SessionPolicy,

    /// Token generator.
    generator: TokenGenerator,
}

impl InMemorySessionStore {
    /// Create a new store with the default policy.
    pub fn new() -> Self {
        Self::with_policy(SessionPolicy::default())
    }

    /// Create a new store with the given policy.
    pub fn with_policy(policy: SessionPolicy) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            by_principal: Arc::new(DashMap::new()),
            generator: TokenGenerator::new(policy.token_style),
            policy,
        }
    }

    /// Get the store's policy.
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    fn is_dead(&self, session: &Session, now: chrono::DateTime<Utc>) -> bool {
        if session.is_expired_at(now) {
            return true;
        }
        match self.policy.idle_timeout {
            Some(idle) => session.is_idle_at(now, idle),
            None => false,
        }
    }

    fn fresh_token(&self) -> Token {
        let mut token = self.generator.generate();
        for _ in 1..MAX_TOKEN_ATTEMPTS {
            if !self.sessions.contains_key(&token) {
                break;
            }
            token = self.generator.generate();
        }
        token
    }

    fn unindex(&self, key: &PrincipalKey, token: &Token) {
        let now_empty = match self.by_principal.get_mut(key) {
            Some(mut tokens) => {
                tokens.retain(|t| t != token);
                tokens.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_principal.remove_if(key, |_, tokens| tokens.is_empty());
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, principal: Principal, ttl: Option<Duration>) -> Result<Token, SessionError> {
        principal.validate()?;

        let now = Utc::now();
        let key = principal.key().clone();
        let token = self.fresh_token();
        let session = Session::new_at(token.clone(), principal, ttl, now);

        // Insert under the principal's index lock so concurrent logins of the
        // same principal observe a consistent session count.
        let displaced = {
            let mut tokens = self.by_principal.entry(key.clone()).or_default();
            self.sessions.insert(token.clone(), session);

            // Forget tokens whose sessions were removed elsewhere
            tokens.retain(|t| self.sessions.contains_key(t));

            let mut displaced = Vec::new();
            if !self.policy.concurrent_login {
                displaced.append(&mut *tokens);
            }
            tokens.push(token.clone());

            if let Some(cap) = self.policy.session_cap() {
                let excess = tokens.len().saturating_sub(cap);
                displaced.extend(tokens.drain(..excess));
            }
            displaced
        };

        for old in &displaced {
            self.sessions.remove(old);
        }

        if displaced.is_empty() {
            debug!(principal = %key, token = %token.redacted(), "Session created");
        } else {
            info!(
                principal = %key,
                token = %token.redacted(),
                displaced = displaced.len(),
                "Session created, older sessions replaced"
            );
        }

        Ok(token)
    }

    fn lookup(&self, token: &Token) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.value().clone())
            .ok_or(SessionError::TokenNotFound)?;

        // Check if the session is still alive
        if self.is_dead(&session, Utc::now()) {
            return Err(SessionError::SessionExpired);
        }

        Ok(session)
    }

    fn touch(&self, token: &Token) -> bool {
        let now = Utc::now();
        match self.sessions.get_mut(token) {
            Some(mut session) if !self.is_dead(&session, now) => {
                session.touch_at(now);
                true
            }
            _ => false,
        }
    }

    fn renew(&self, token: &Token, ttl: Option<Duration>) -> bool {
        let now = Utc::now();
        match self.sessions.get_mut(token) {
            Some(mut session) if !self.is_dead(&session, now) => {
                session.renew_at(ttl, now);
                debug!(token = %token.redacted(), "Session renewed");
                true
            }
            _ => false,
        }
    }

    fn destroy(&self, token: &Token) -> Option<Session> {
        let (_, session) = self.sessions.remove(token)?;
        self.unindex(session.principal_key(), token);

        debug!(principal = %session.principal_key(), token = %token.redacted(), "Session destroyed");
        Some(session)
    }

    fn destroy_all_for(&self, principal: &PrincipalKey) -> usize {
        let tokens = match self.by_principal.remove(principal) {
            Some((_, tokens)) => tokens,
            None => return 0,
        };

        let removed = tokens
            .iter()
            .filter(|t| self.sessions.remove(*t).is_some())
            .count();

        if removed > 0 {
            info!(principal = %principal, removed, "All sessions destroyed");
        }
        removed
    }

    fn sessions_for(&self, principal: &PrincipalKey) -> Vec<Session> {
        let tokens = match self.by_principal.get(principal) {
            Some(tokens) => tokens.value().clone(),
            None => return Vec::new(),
        };

        let now = Utc::now();
        tokens
            .iter()
            .filter_map(|t| self.sessions.get(t).map(|s| s.value().clone()))
            .filter(|s| !self.is_dead(s, now))
            .collect()
    }

    fn set_attribute(&self, token: &Token, key: String, value: serde_json::Value) -> bool {
        let now = Utc::now();
        match self.sessions.get_mut(token) {
            Some(mut session) if !self.is_dead(&session, now) => {
                session.attributes.insert(key, value);
                true
            }
            _ => false,
        }
    }

    fn remove_attribute(&self, token: &Token, key: &str) -> Option<serde_json::Value> {
        self.sessions
            .get_mut(token)
            .and_then(|mut session| session.attributes.remove(key))
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();

        self.sessions.retain(|_, session| !self.is_dead(session, now));

        // Drop index entries that point at purged sessions
        self.by_principal.retain(|_, tokens| {
            tokens.retain(|t| self.sessions.contains_key(t));
            !tokens.is_empty()
        });

        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        purged
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use warden_core::id::AccountType;

    fn principal(id: &str) -> Principal {
        Principal::with_default_account(id)
    }

    #[test]
    fn test_create_and_resolve() {
        let store = InMemorySessionStore::new();
        let token = store.create(principal("U1"), None).unwrap();

        let session = store.resolve(&token).unwrap();
        assert_eq!(session.principal.id(), "U1");
        assert_eq!(session.token, token);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_token() {
        let store = InMemorySessionStore::new();
        assert!(store.resolve(&Token::new("nope")).is_none());
        assert_eq!(
            store.lookup(&Token::new("nope")),
            Err(SessionError::TokenNotFound)
        );
    }

    #[test]
    fn test_invalid_principal_rejected() {
        let store = InMemorySessionStore::new();
        let result = store.create(principal("  "), None);
        assert!(matches!(result, Err(SessionError::InvalidPrincipal(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_session_is_absent() {
        let store = InMemorySessionStore::new();
        let token = store
            .create(principal("U1"), Some(Duration::from_millis(150)))
            .unwrap();
        assert!(store.resolve(&token).is_some());

        thread::sleep(Duration::from_millis(250));

        assert_eq!(store.lookup(&token), Err(SessionError::SessionExpired));
        assert!(!store.touch(&token));
        // Lazy expiry keeps the entry until a purge
        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_idle_timeout() {
        let store = InMemorySessionStore::with_policy(SessionPolicy {
            idle_timeout: Some(Duration::from_millis(300)),
            ..SessionPolicy::default()
        });
        let token = store.create(principal("U1"), None).unwrap();

        thread::sleep(Duration::from_millis(150));
        assert!(store.touch(&token));
        thread::sleep(Duration::from_millis(150));
        assert!(store.resolve(&token).is_some());

        thread::sleep(Duration::from_millis(400));
        assert_eq!(store.lookup(&token), Err(SessionError::SessionExpired));
    }

    #[test]
    fn test_renew_extends_lifetime() {
        let store = InMemorySessionStore::new();
        let token = store
            .create(principal("U1"), Some(Duration::from_millis(200)))
            .unwrap();

        assert!(store.renew(&token, Some(Duration::from_secs(60))));
        thread::sleep(Duration::from_millis(300));
        assert!(store.resolve(&token).is_some());
    }

    #[test]
    fn test_destroy() {
        let store = InMemorySessionStore::new();
        let token = store.create(principal("U1"), None).unwrap();

        let session = store.destroy(&token).unwrap();
        assert_eq!(session.principal.id(), "U1");
        assert!(store.resolve(&token).is_none());
        assert!(store.destroy(&token).is_none());
        assert!(store.sessions_for(&PrincipalKey::with_default_account("U1")).is_empty());
    }

    #[test]
    fn test_destroy_all_for_principal() {
        let store = InMemorySessionStore::new();
        let a = store.create(principal("U1"), None).unwrap();
        let b = store.create(principal("U1"), None).unwrap();
        let other = store.create(principal("U2"), None).unwrap();

        let key = PrincipalKey::with_default_account("U1");
        assert_eq!(store.sessions_for(&key).len(), 2);
        assert_eq!(store.destroy_all_for(&key), 2);

        assert!(store.resolve(&a).is_none());
        assert!(store.resolve(&b).is_none());
        assert!(store.resolve(&other).is_some());
        assert_eq!(store.destroy_all_for(&key), 0);
    }

    #[test]
    fn test_single_session_policy_replaces_old_login() {
        let store = InMemorySessionStore::with_policy(SessionPolicy {
            concurrent_login: false,
            ..SessionPolicy::default()
        });
        let first = store.create(principal("U1"), None).unwrap();
        let second = store.create(principal("U1"), None).unwrap();

        assert!(store.resolve(&first).is_none());
        assert!(store.resolve(&second).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_cap_evicts_oldest() {
        let store = InMemorySessionStore::with_policy(SessionPolicy {
            max_sessions_per_principal: Some(2),
            ..SessionPolicy::default()
        });
        let first = store.create(principal("U1"), None).unwrap();
        let second = store.create(principal("U1"), None).unwrap();
        let third = store.create(principal("U1"), None).unwrap();

        assert!(store.resolve(&first).is_none());
        assert!(store.resolve(&second).is_some());
        assert!(store.resolve(&third).is_some());

        let tokens = store.tokens_for(&PrincipalKey::with_default_account("U1"));
        assert_eq!(tokens, vec![second, third]);
    }

    #[test]
    fn test_account_types_are_isolated() {
        let store = InMemorySessionStore::with_policy(SessionPolicy {
            concurrent_login: false,
            ..SessionPolicy::default()
        });
        let staff = store
            .create(Principal::new(AccountType::new("staff"), "U1"), None)
            .unwrap();
        let customer = store
            .create(Principal::new(AccountType::new("customer"), "U1"), None)
            .unwrap();

        assert!(store.resolve(&staff).is_some());
        assert!(store.resolve(&customer).is_some());

        store.destroy_all_for(&PrincipalKey::new(AccountType::new("staff"), "U1"));
        assert!(store.resolve(&staff).is_none());
        assert!(store.resolve(&customer).is_some());
    }

    #[test]
    fn test_attributes() {
        let store = InMemorySessionStore::new();
        let token = store.create(principal("U1"), None).unwrap();

        assert!(store.set_attribute(&token, "theme".to_string(), serde_json::json!("dark")));
        let session = store.resolve(&token).unwrap();
        assert_eq!(session.attribute("theme"), Some(&serde_json::json!("dark")));
        assert_eq!(
            store.attribute(&token, "theme"),
            Some(serde_json::json!("dark"))
        );

        assert_eq!(
            store.remove_attribute(&token, "theme"),
            Some(serde_json::json!("dark"))
        );
        assert!(!store.set_attribute(&Token::new("nope"), "k".to_string(), serde_json::json!(1)));
    }

    #[test]
    fn test_purge_keeps_live_sessions() {
        let store = InMemorySessionStore::new();
        let live = store.create(principal("U1"), None).unwrap();
        store
            .create(principal("U2"), Some(Duration::from_millis(10)))
            .unwrap();

        thread::sleep(Duration::from_millis(30));

        assert_eq!(store.purge_expired(), 1);
        assert!(store.resolve(&live).is_some());
        assert!(store
            .sessions_for(&PrincipalKey::with_default_account("U2"))
            .is_empty());
    }
}
