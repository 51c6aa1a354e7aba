//! Decision audit log.
//!
//! Keeps the most recent guard decisions per principal. Anonymous requests
//! share a single bucket.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use warden_core::error::{AuthError, AuthErrorKind};
use warden_core::id::PrincipalKey;
use warden_core::utils::elapsed_between;

use crate::model::Rule;

/// An entry in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,

    /// The principal the decision was about, if one was resolved.
    pub principal: Option<PrincipalKey>,

    /// The guarded operation, if the guard was invoked by name.
    pub operation: Option<String>,

    /// The rule that was evaluated, in display form.
    pub rule: String,

    /// Whether the operation was permitted.
    pub allowed: bool,

    /// The failure kind, for denials and resolver failures.
    pub kind: Option<AuthErrorKind>,

    /// The role, permission, scope or service the failure was about.
    pub scope_or_key: Option<String>,
}

impl AuditEntry {
    /// Create an entry for a guard decision.
    pub fn new(
        principal: Option<PrincipalKey>,
        operation: Option<&str>,
        rule: &Rule,
        decision: &Result<(), AuthError>,
    ) -> Self {
        let (kind, scope_or_key) = match decision {
            Ok(()) => (None, None),
            Err(err) => (Some(err.kind()), err.scope_or_key().map(str::to_string)),
        };

        Self {
            timestamp: Utc::now(),
            principal,
            operation: operation.map(str::to_string),
            rule: rule.to_string(),
            allowed: decision.is_ok(),
            kind,
            scope_or_key,
        }
    }
}

/// Recent decisions for one principal.
#[derive(Debug, Clone)]
struct Bucket {
    entries: VecDeque<AuditEntry>,
    last_recorded: DateTime<Utc>,
}

/// A thread-safe audit log of guard decisions.
///
/// Buckets are sharded by principal, so recording a decision for one
/// principal never waits on another. The log is bounded twice: each bucket
/// keeps at most `max_entries_per_principal` entries, and at most
/// `max_principals` buckets exist at once (the least recently written one
/// is evicted to make room).
pub struct AuditLog {
    /// Entries per principal; `None` holds anonymous decisions.
    entries: DashMap<Option<PrincipalKey>, Bucket>,

    /// Maximum number of entries per principal.
    max_entries_per_principal: usize,

    /// Maximum number of principals with a bucket.
    max_principals: usize,
}

impl AuditLog {
    /// Creates a new audit log with the specified maximum entries per principal.
    pub fn new(max_entries_per_principal: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries_per_principal,
            max_principals: usize::MAX,
        }
    }

    /// Bound the number of principals with a bucket.
    pub fn with_max_principals(mut self, max_principals: usize) -> Self {
        self.max_principals = max_principals.max(1);
        self
    }

    /// Records a decision.
    pub fn record(&self, entry: AuditEntry) {
        let key = entry.principal.clone();

        // Make room before a new principal gets a bucket
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_principals {
            self.evict_least_recent();
        }

        let mut bucket = self.entries.entry(key).or_insert_with(|| Bucket {
            entries: VecDeque::new(),
            last_recorded: entry.timestamp,
        });

        bucket.last_recorded = entry.timestamp;
        bucket.entries.push_back(entry);

        // Trim to max size if needed
        while bucket.entries.len() > self.max_entries_per_principal {
            bucket.entries.pop_front();
        }
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|bucket| bucket.last_recorded)
            .map(|bucket| bucket.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    /// Gets the entries for a principal, oldest first.
    pub fn entries_for(&self, principal: &PrincipalKey) -> Vec<AuditEntry> {
        self.bucket_entries(&Some(principal.clone()))
    }

    /// Gets the entries for anonymous requests, oldest first.
    pub fn anonymous_entries(&self) -> Vec<AuditEntry> {
        self.bucket_entries(&None)
    }

    fn bucket_entries(&self, key: &Option<PrincipalKey>) -> Vec<AuditEntry> {
        self.entries
            .get(key)
            .map(|bucket| bucket.entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Gets every entry, ordered by time.
    pub fn all_entries(&self) -> Vec<AuditEntry> {
        let mut all = Vec::new();
        for bucket in self.entries.iter() {
            all.extend(bucket.entries.iter().cloned());
        }
        all.sort_by_key(|entry| entry.timestamp);
        all
    }

    /// Gets the denials recorded for a principal.
    pub fn denials_for(&self, principal: &PrincipalKey) -> Vec<AuditEntry> {
        self.entries_for(principal)
            .into_iter()
            .filter(|entry| !entry.allowed)
            .collect()
    }

    /// Clears the entries for a principal. Returns `false` if there were none.
    pub fn clear_entries(&self, principal: &PrincipalKey) -> bool {
        self.entries.remove(&Some(principal.clone())).is_some()
    }

    /// Clears all entries.
    pub fn clear_all_entries(&self) {
        self.entries.clear();
    }

    /// Drops the history of every principal with no decision in the last
    /// `max_age`. Returns how many histories were dropped.
    pub fn purge_idle(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut removed = 0;

        self.entries.retain(|_, bucket| {
            let keep = elapsed_between(bucket.last_recorded, now) < max_age;
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Gets the number of principals with recorded decisions.
    pub fn principal_count(&self) -> usize {
        self.entries.len()
    }

    /// Gets the maximum number of entries per principal.
    pub fn max_entries_per_principal(&self) -> usize {
        self.max_entries_per_principal
    }

    /// Gets the maximum number of principals with a bucket.
    pub fn max_principals(&self) -> usize {
        self.max_principals
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("principals", &self.entries.len())
            .field("max_entries_per_principal", &self.max_entries_per_principal)
            .field("max_principals", &self.max_principals)
            .finish()
    }
}
