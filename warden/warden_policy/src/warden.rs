//! The Warden façade.
//!
//! [`Warden`] owns one instance of every stateful component (session store,
//! step-up tracker, ban ledger, audit log, operation registry, reaper) and
//! wires them to a guard dispatcher. Construct one at startup and share it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use warden_core::error::{AuthError, SessionError};
use warden_core::id::{PrincipalKey, Token};
use warden_core::traits::GrantResolver;
use warden_core::types::Principal;
use warden_core::utils::WardenConfig;
use warden_store::{
    BanDuration, BanLedger, BanRemaining, InMemorySessionStore, Reaper, SafeZoneTracker,
    SessionPolicy, SessionStore,
};

use crate::engine::{AuditLog, GuardDispatcher, GuardedOperation, OperationRegistry, RuleEvaluator};
use crate::error::PolicyError;
use crate::model::{EvalResult, RequestContext, Rule};

/// The authorization core.
pub struct Warden {
    config: WardenConfig,
    sessions: Arc<dyn SessionStore>,
    safe_zones: SafeZoneTracker,
    bans: BanLedger,
    dispatcher: GuardDispatcher,
    operations: OperationRegistry,
    reaper: Option<Reaper>,
}

impl Warden {
    /// Create a Warden backed by the in-memory session store.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration; validated before use.
    /// * `resolver` - Supplies roles and permissions for principals.
    ///
    /// # Returns
    ///
    /// * `Ok(Warden)` - The running core.
    /// * `Err(PolicyError)` - If the configuration is invalid or the reaper could not start.
    pub fn new<R>(config: WardenConfig, resolver: R) -> Result<Self, PolicyError>
    where
        R: GrantResolver + 'static,
    {
        let sessions = Arc::new(InMemorySessionStore::with_policy(
            SessionPolicy::from_config(&config),
        ));
        Self::with_session_store(config, resolver, sessions)
    }

    /// Create a Warden backed by the given session store.
    pub fn with_session_store<R>(
        config: WardenConfig,
        resolver: R,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, PolicyError>
    where
        R: GrantResolver + 'static,
    {
        config.validate()?;

        let safe_zones = SafeZoneTracker::new();
        let bans = BanLedger::new();

        let evaluator = RuleEvaluator::new(
            sessions.clone(),
            Arc::new(resolver),
            safe_zones.clone(),
            bans.clone(),
        )
        .with_resolver_timeout(config.resolver_timeout())
        .with_resolver_concurrency(config.resolver_max_in_flight);

        let mut dispatcher = GuardDispatcher::new(evaluator);
        if config.audit_capacity > 0 {
            let audit = AuditLog::new(config.audit_capacity)
                .with_max_principals(config.audit_max_principals);
            dispatcher = dispatcher.with_audit_log(Arc::new(audit));
        }

        let reaper = match config.reaper_interval() {
            Some(interval) => {
                let sessions = sessions.clone();
                let safe_zones = safe_zones.clone();
                let bans = bans.clone();
                let audit = dispatcher.audit_log().cloned();
                let retention = config.audit_retention();
                Some(Reaper::spawn(interval, move || {
                    let audit_purged = audit
                        .as_ref()
                        .map_or(0, |audit| audit.purge_idle(retention));
                    sessions.purge_expired()
                        + safe_zones.purge_expired()
                        + bans.purge_expired()
                        + audit_purged
                })?)
            }
            None => None,
        };

        info!(
            token_style = %config.token_style,
            concurrent_login = config.concurrent_login,
            reaper = reaper.is_some(),
            "Warden initialized"
        );

        Ok(Self {
            config,
            sessions,
            safe_zones,
            bans,
            dispatcher,
            operations: OperationRegistry::new(),
            reaper,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Get the session store.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Get the step-up tracker.
    pub fn safe_zones(&self) -> &SafeZoneTracker {
        &self.safe_zones
    }

    /// Get the ban ledger.
    pub fn bans(&self) -> &BanLedger {
        &self.bans
    }

    /// Get the guard dispatcher.
    pub fn dispatcher(&self) -> &GuardDispatcher {
        &self.dispatcher
    }

    /// Get the audit log, if auditing is enabled.
    pub fn audit_log(&self) -> Option<&Arc<AuditLog>> {
        self.dispatcher.audit_log()
    }

    /// Get the operation registry.
    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }

    /// Check if the background reaper is running.
    pub fn reaper_running(&self) -> bool {
        self.reaper.is_some()
    }

    /// Log a principal in with the configured session lifetime.
    pub fn login(&self, principal: Principal) -> Result<Token, SessionError> {
        self.login_with_ttl(principal, self.config.session_timeout())
    }

    /// Log a principal in with an explicit session lifetime.
    pub fn login_with_ttl(
        &self,
        principal: Principal,
        ttl: Option<Duration>,
    ) -> Result<Token, SessionError> {
        let key = principal.key().clone();
        let token = self.sessions.create(principal, ttl)?;

        info!(principal = %key, token = %token.redacted(), "Login");
        Ok(token)
    }

    /// End one session. Returns `false` if the token was not known.
    pub fn logout(&self, token: &Token) -> bool {
        match self.sessions.destroy(token) {
            Some(session) => {
                info!(principal = %session.principal_key(), "Logout");
                true
            }
            None => false,
        }
    }

    /// End every session of a principal, close its safe zones and drop its
    /// audit history.
    ///
    /// Bans are left in place. Returns how many sessions were ended.
    pub fn kick(&self, principal: &PrincipalKey) -> usize {
        let sessions = self.sessions.destroy_all_for(principal);
        let zones = self.safe_zones.close_all(principal);
        if let Some(audit) = self.audit_log() {
            audit.clear_entries(principal);
        }

        info!(principal = %principal, sessions, zones, "Principal kicked");
        sessions
    }

    /// Open a safe zone with the configured default lifetime.
    pub fn open_safe(&self, principal: &PrincipalKey, scope: &str) -> DateTime<Utc> {
        self.open_safe_for(principal, scope, self.config.default_safe_ttl())
    }

    /// Open a safe zone with an explicit lifetime.
    pub fn open_safe_for(
        &self,
        principal: &PrincipalKey,
        scope: &str,
        ttl: Duration,
    ) -> DateTime<Utc> {
        let expires_at = self.safe_zones.open(principal, scope, ttl);
        info!(principal = %principal, scope, %expires_at, "Safe zone opened");
        expires_at
    }

    /// Close a safe zone.
    pub fn close_safe(&self, principal: &PrincipalKey, scope: &str) -> bool {
        self.safe_zones.close(principal, scope)
    }

    /// Check if a safe zone is open.
    pub fn is_safe(&self, principal: &PrincipalKey, scope: &str) -> bool {
        self.safe_zones.is_open(principal, scope)
    }

    /// Ban a principal from a service.
    pub fn ban(&self, principal: &PrincipalKey, service: &str, duration: BanDuration) {
        self.bans.ban(principal, service, duration);
    }

    /// Lift a ban.
    pub fn unban(&self, principal: &PrincipalKey, service: &str) -> bool {
        self.bans.unban(principal, service)
    }

    /// Check if a principal is banned from a service.
    pub fn is_banned(&self, principal: &PrincipalKey, service: &str) -> bool {
        self.bans.is_banned(principal, service)
    }

    /// Time left on a ban.
    pub fn ban_remaining(&self, principal: &PrincipalKey, service: &str) -> Option<BanRemaining> {
        self.bans.remaining(principal, service)
    }

    /// Evaluate a rule without logging or auditing a guard decision.
    pub fn evaluate(&self, rule: &Rule, ctx: &RequestContext) -> Result<EvalResult, AuthError> {
        self.dispatcher.evaluator().evaluate(rule, ctx)
    }

    /// Check a rule against a request.
    pub fn guard(&self, rule: &Rule, ctx: &RequestContext) -> Result<(), AuthError> {
        self.dispatcher.guard(rule, ctx)
    }

    /// Declare a guarded operation.
    pub fn register_operation(&self, operation: GuardedOperation) {
        info!(operation = %operation.name, rule = %operation.rule, "Guarded operation registered");
        self.operations.register(operation);
    }

    /// Check the rule declared for a named operation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the operation may run.
    /// * `Err(PolicyError::UnknownOperation)` - If no such operation is declared.
    /// * `Err(PolicyError::Auth)` - If the guard denied or could not decide.
    pub fn guard_operation(&self, name: &str, ctx: &RequestContext) -> Result<(), PolicyError> {
        let rule = self
            .operations
            .rule_for(name)
            .ok_or_else(|| PolicyError::UnknownOperation(name.to_string()))?;

        self.dispatcher.guard_named(name, &rule, ctx)?;
        Ok(())
    }

    /// Remove expired sessions, safe zones and bans, and audit histories
    /// older than the retention period.
    pub fn purge_expired(&self) -> usize {
        let audit_purged = self
            .audit_log()
            .map_or(0, |audit| audit.purge_idle(self.config.audit_retention()));

        self.sessions.purge_expired()
            + self.safe_zones.purge_expired()
            + self.bans.purge_expired()
            + audit_purged
    }

    /// Stop the reaper and wait for it to exit.
    pub fn shutdown(mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.stop();
        }
        info!("Warden shut down");
    }
}

impl std::fmt::Debug for Warden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warden")
            .field("sessions", &self.sessions.len())
            .field("safe_zones", &self.safe_zones.len())
            .field("bans", &self.bans.len())
            .field("operations", &self.operations.len())
            .field("reaper", &self.reaper)
            .finish()
    }
}
