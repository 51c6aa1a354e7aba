//! Per-service bans.
//!
//! A ban blocks one principal from one named service, either for a bounded
//! time or until it is lifted. Bans for different services are independent.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use warden_core::id::PrincipalKey;
use warden_core::utils::{deadline_after, elapsed_between};

/// How long a ban lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanDuration {
    /// The ban lifts itself after the given time.
    For(Duration),

    /// The ban lasts until explicitly lifted.
    Permanent,
}

/// Time left on an active ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanRemaining {
    /// The ban lifts after this long.
    For(Duration),

    /// The ban never lifts on its own.
    Permanent,
}

impl fmt::Display for BanRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::For(left) => write!(f, "{}s", left.as_secs()),
            Self::Permanent => f.write_str("permanent"),
        }
    }
}

/// A stored ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ban {
    banned_at: DateTime<Utc>,
    /// `None` for permanent bans.
    expires_at: Option<DateTime<Utc>>,
}

impl Ban {
    fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }

    fn remaining_at(&self, now: DateTime<Utc>) -> Option<BanRemaining> {
        match self.expires_at {
            Some(expires_at) if now < expires_at => {
                Some(BanRemaining::For(elapsed_between(now, expires_at)))
            }
            Some(_) => None,
            None => Some(BanRemaining::Permanent),
        }
    }
}

type BanKey = (PrincipalKey, String);

/// Records which principals are banned from which services.
#[derive(Debug, Clone, Default)]
pub struct BanLedger {
    bans: Arc<DashMap<BanKey, Ban>>,
}

impl BanLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ban a principal from a service, replacing any existing ban for it.
    pub fn ban(&self, principal: &PrincipalKey, service: &str, duration: BanDuration) {
        let now = Utc::now();
        let expires_at = match duration {
            BanDuration::For(ttl) => Some(deadline_after(now, ttl)),
            BanDuration::Permanent => None,
        };

        self.bans.insert(
            (principal.clone(), service.to_string()),
            Ban {
                banned_at: now,
                expires_at,
            },
        );

        info!(principal = %principal, service, ?duration, "Principal banned");
    }

    /// Lift a ban. Returns `true` if an active ban was lifted.
    pub fn unban(&self, principal: &PrincipalKey, service: &str) -> bool {
        let now = Utc::now();
        match self.bans.remove(&(principal.clone(), service.to_string())) {
            Some((_, ban)) => {
                info!(principal = %principal, service, "Ban lifted");
                ban.is_active_at(now)
            }
            None => false,
        }
    }

    /// Check if a principal is banned from a service.
    pub fn is_banned(&self, principal: &PrincipalKey, service: &str) -> bool {
        self.remaining(principal, service).is_some()
    }

    /// Time left on a ban, or `None` if the principal is not banned.
    pub fn remaining(&self, principal: &PrincipalKey, service: &str) -> Option<BanRemaining> {
        let key = (principal.clone(), service.to_string());
        let now = Utc::now();

        let ban = *self.bans.get(&key)?;
        let remaining = ban.remaining_at(now);
        if remaining.is_none() {
            self.bans.remove_if(&key, |_, ban| !ban.is_active_at(now));
        }
        remaining
    }

    /// When a principal was banned from a service, if the ban is active.
    pub fn banned_since(&self, principal: &PrincipalKey, service: &str) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        self.bans
            .get(&(principal.clone(), service.to_string()))
            .filter(|ban| ban.is_active_at(now))
            .map(|ban| ban.banned_at)
    }

    /// List the services a principal is currently banned from.
    pub fn banned_services(&self, principal: &PrincipalKey) -> Vec<String> {
        let now = Utc::now();
        let mut services: Vec<String> = self
            .bans
            .iter()
            .filter(|entry| &entry.key().0 == principal && entry.value().is_active_at(now))
            .map(|entry| entry.key().1.clone())
            .collect();
        services.sort();
        services
    }

    /// Remove lapsed bans. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.bans.len();
        self.bans.retain(|_, ban| ban.is_active_at(now));
        before.saturating_sub(self.bans.len())
    }

    /// Number of stored bans, including lapsed ones not yet purged.
    pub fn len(&self) -> usize {
        self.bans.len()
    }

    /// Check if no bans are stored.
    pub fn is_empty(&self) -> bool {
        self.bans.is_empty()
    }
}
