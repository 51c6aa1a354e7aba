//! Session model.
//!
//! A [`Session`] is one active login bound to an opaque [`Token`]. Expiry is
//! never enforced eagerly: every check takes the current time and compares
//! it against the stored deadlines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::id::{PrincipalKey, Token};
use crate::types::Principal;
use crate::utils::time::{deadline_after, elapsed_between};

/// One active login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The opaque token the session is bound to.
    pub token: Token,

    /// The logged-in subject.
    pub principal: Principal,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session was last used.
    pub last_active_at: DateTime<Utc>,

    /// When the session expires; `None` means "until explicit logout".
    pub expires_at: Option<DateTime<Utc>>,

    /// Application-defined attributes.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Create a session starting at `now`.
    pub fn new_at(
        token: Token,
        principal: Principal,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            principal,
            created_at: now,
            last_active_at: now,
            expires_at: ttl.map(|ttl| deadline_after(now, ttl)),
            attributes: HashMap::new(),
        }
    }

    /// Get the key of the session's principal.
    pub fn principal_key(&self) -> &PrincipalKey {
        self.principal.key()
    }

    /// Check if the session has passed its expiry deadline.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Check if the session has been idle for at least `idle_timeout`.
    pub fn is_idle_at(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        elapsed_between(self.last_active_at, now) >= idle_timeout
    }

    /// Time left until expiry, or `None` if the session never expires.
    ///
    /// An expired session reports `Some(Duration::ZERO)`.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| elapsed_between(now, expires_at))
    }

    /// Record activity at `now`.
    pub fn touch_at(&mut self, now: DateTime<Utc>) {
        if now > self.last_active_at {
            self.last_active_at = now;
        }
    }

    /// Reset the expiry deadline to `now + ttl`, or remove it.
    pub fn renew_at(&mut self, ttl: Option<Duration>, now: DateTime<Utc>) {
        self.expires_at = ttl.map(|ttl| deadline_after(now, ttl));
        self.touch_at(now);
    }

    /// Get an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn session(ttl: Option<Duration>, now: DateTime<Utc>) -> Session {
        Session::new_at(
            Token::new("token-1"),
            Principal::with_default_account("U1"),
            ttl,
            now,
        )
    }

    #[test]
    fn test_unbounded_session_never_expires() {
        let now = Utc::now();
        let session = session(None, now);

        assert!(!session.is_expired_at(now + ChronoDuration::days(3650)));
        assert_eq!(session.remaining_at(now), None);
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let now = Utc::now();
        let session = session(Some(Duration::from_secs(10)), now);

        assert!(!session.is_expired_at(now + ChronoDuration::seconds(9)));
        assert!(session.is_expired_at(now + ChronoDuration::seconds(10)));
        assert_eq!(
            session.remaining_at(now + ChronoDuration::seconds(4)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(
            session.remaining_at(now + ChronoDuration::seconds(20)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_idle_and_touch() {
        let now = Utc::now();
        let mut session = session(None, now);
        let idle = Duration::from_secs(30);

        assert!(session.is_idle_at(now + ChronoDuration::seconds(31), idle));

        session.touch_at(now + ChronoDuration::seconds(20));
        assert!(!session.is_idle_at(now + ChronoDuration::seconds(31), idle));

        // Touching with an older timestamp does not move activity backwards.
        session.touch_at(now);
        assert_eq!(session.last_active_at, now + ChronoDuration::seconds(20));
    }

    #[test]
    fn test_renew() {
        let now = Utc::now();
        let mut session = session(Some(Duration::from_secs(5)), now);
        let later = now + ChronoDuration::seconds(4);

        session.renew_at(Some(Duration::from_secs(60)), later);
        assert!(!session.is_expired_at(now + ChronoDuration::seconds(30)));
        assert_eq!(session.last_active_at, later);

        session.renew_at(None, later);
        assert_eq!(session.expires_at, None);
    }
}
