//! Step-up safe zones.
//!
//! A safe zone records that a principal recently re-verified identity for a
//! named scope. Zones expire on their own; an expired zone is inert and is
//! dropped the next time it is read or purged.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use warden_core::id::PrincipalKey;
use warden_core::utils::{deadline_after, elapsed_between};

type ZoneKey = (PrincipalKey, String);

/// Tracks open safe zones per principal and scope.
#[derive(Debug, Clone, Default)]
pub struct SafeZoneTracker {
    /// Expiry deadline of each open zone.
    zones: Arc<DashMap<ZoneKey, DateTime<Utc>>>,
}

impl SafeZoneTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) a safe zone.
    ///
    /// Re-opening an open zone resets its deadline to `now + ttl`.
    ///
    /// # Returns
    ///
    /// The zone's new expiry deadline.
    pub fn open(&self, principal: &PrincipalKey, scope: &str, ttl: Duration) -> DateTime<Utc> {
        let expires_at = deadline_after(Utc::now(), ttl);
        self.zones
            .insert((principal.clone(), scope.to_string()), expires_at);

        debug!(principal = %principal, scope, ?ttl, "Safe zone opened");
        expires_at
    }

    /// Close a safe zone. Returns `true` if an open zone was closed.
    pub fn close(&self, principal: &PrincipalKey, scope: &str) -> bool {
        let now = Utc::now();
        match self.zones.remove(&(principal.clone(), scope.to_string())) {
            Some((_, expires_at)) => {
                debug!(principal = %principal, scope, "Safe zone closed");
                now < expires_at
            }
            None => false,
        }
    }

    /// Close every zone of a principal. Returns how many open zones were closed.
    pub fn close_all(&self, principal: &PrincipalKey) -> usize {
        let now = Utc::now();
        let mut closed = 0;
        self.zones.retain(|(key, _), expires_at| {
            if key != principal {
                return true;
            }
            if now < *expires_at {
                closed += 1;
            }
            false
        });
        closed
    }

    /// Check if a zone is open.
    pub fn is_open(&self, principal: &PrincipalKey, scope: &str) -> bool {
        self.remaining(principal, scope).is_some()
    }

    /// Time left in an open zone, or `None` if it is closed or expired.
    pub fn remaining(&self, principal: &PrincipalKey, scope: &str) -> Option<Duration> {
        let key = (principal.clone(), scope.to_string());
        let now = Utc::now();

        let expires_at = *self.zones.get(&key)?;
        if now < expires_at {
            return Some(elapsed_between(now, expires_at));
        }

        // Expired zones are dropped on read
        self.zones.remove_if(&key, |_, deadline| now >= *deadline);
        None
    }

    /// List the scopes a principal currently has open.
    pub fn open_scopes(&self, principal: &PrincipalKey) -> Vec<String> {
        let now = Utc::now();
        let mut scopes: Vec<String> = self
            .zones
            .iter()
            .filter(|entry| &entry.key().0 == principal && now < *entry.value())
            .map(|entry| entry.key().1.clone())
            .collect();
        scopes.sort();
        scopes
    }

    /// Remove expired zones. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.zones.len();
        self.zones.retain(|_, expires_at| now < *expires_at);
        before.saturating_sub(self.zones.len())
    }

    /// Number of stored zones, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Check if no zones are stored.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use warden_core::id::{AccountType, GLOBAL_SCOPE};

    fn key(id: &str) -> PrincipalKey {
        PrincipalKey::with_default_account(id)
    }

    #[test]
    fn test_open_and_close() {
        let tracker = SafeZoneTracker::new();
        let u1 = key("U1");

        assert!(!tracker.is_open(&u1, GLOBAL_SCOPE));
        tracker.open(&u1, GLOBAL_SCOPE, Duration::from_secs(60));
        assert!(tracker.is_open(&u1, GLOBAL_SCOPE));

        assert!(tracker.close(&u1, GLOBAL_SCOPE));
        assert!(!tracker.is_open(&u1, GLOBAL_SCOPE));
        assert!(!tracker.close(&u1, GLOBAL_SCOPE));
    }

    #[test]
    fn test_scopes_are_independent() {
        let tracker = SafeZoneTracker::new();
        let u1 = key("U1");

        tracker.open(&u1, "payments", Duration::from_secs(60));
        assert!(tracker.is_open(&u1, "payments"));
        assert!(!tracker.is_open(&u1, "profile"));
        assert!(!tracker.is_open(&key("U2"), "payments"));
        assert!(!tracker.is_open(
            &PrincipalKey::new(AccountType::new("staff"), "U1"),
            "payments"
        ));
    }

    #[test]
    fn test_zone_expires() {
        let tracker = SafeZoneTracker::new();
        let u1 = key("U1");

        tracker.open(&u1, "payments", Duration::from_millis(100));
        assert!(tracker.is_open(&u1, "payments"));

        thread::sleep(Duration::from_millis(200));
        assert!(!tracker.is_open(&u1, "payments"));
        assert_eq!(tracker.remaining(&u1, "payments"), None);
        // The expired record was dropped on read
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_reopen_resets_deadline() {
        let tracker = SafeZoneTracker::new();
        let u1 = key("U1");

        tracker.open(&u1, "payments", Duration::from_millis(100));
        tracker.open(&u1, "payments", Duration::from_secs(60));

        thread::sleep(Duration::from_millis(200));
        assert!(tracker.is_open(&u1, "payments"));

        let remaining = tracker.remaining(&u1, "payments").unwrap();
        assert!(remaining > Duration::from_secs(55));
    }

    #[test]
    fn test_close_all() {
        let tracker = SafeZoneTracker::new();
        let u1 = key("U1");

        tracker.open(&u1, "payments", Duration::from_secs(60));
        tracker.open(&u1, "profile", Duration::from_secs(60));
        tracker.open(&key("U2"), "payments", Duration::from_secs(60));

        assert_eq!(tracker.open_scopes(&u1), vec!["payments", "profile"]);
        assert_eq!(tracker.close_all(&u1), 2);
        assert!(tracker.open_scopes(&u1).is_empty());
        assert!(tracker.is_open(&key("U2"), "payments"));
    }

    #[test]
    fn test_purge_expired() {
        let tracker = SafeZoneTracker::new();
        tracker.open(&key("U1"), "a", Duration::from_millis(10));
        tracker.open(&key("U1"), "b", Duration::from_secs(60));

        thread::sleep(Duration::from_millis(50));
        assert_eq!(tracker.purge_expired(), 1);
        assert_eq!(tracker.len(), 1);
    }
}
