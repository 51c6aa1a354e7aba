//! Rule evaluation engine.
//!
//! This module provides the rule evaluator. One evaluation resolves each
//! account type's session at most once and calls the grant resolver at most
//! once per principal, and only when the tree actually reaches a role or
//! permission leaf for that principal.

use crossbeam_channel::{bounded, RecvTimeoutError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use warden_core::error::{AuthError, ResolverError};
use warden_core::id::{AccountType, PrincipalKey};
use warden_core::traits::GrantResolver;
use warden_core::types::Grants;
use warden_store::{BanLedger, SafeZoneTracker, SessionStore};

use crate::engine::credentials::{basic_matches, digest_matches};
use crate::model::{EvalResult, Leaf, RequestContext, Rule};

/// Name of the helper thread used for deadline-bounded resolver calls.
const RESOLVER_THREAD_NAME: &str = "warden-resolver";

/// Default limit on deadline-bounded resolver calls running at once.
pub const DEFAULT_MAX_RESOLVER_IN_FLIGHT: usize = 32;

/// A claim on one in-flight resolver call, released on drop.
struct InFlightSlot {
    counter: Arc<AtomicUsize>,
}

impl InFlightSlot {
    fn acquire(counter: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        let mut current = counter.load(Ordering::Acquire);
        loop {
            if current >= max {
                return None;
            }
            match counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(Self {
                        counter: Arc::clone(counter),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Per-evaluation lookups, discarded when the evaluation ends.
#[derive(Default)]
struct Scratch {
    /// Resolved principal for each account type looked up so far.
    principals: HashMap<AccountType, Option<PrincipalKey>>,

    /// Grants fetched so far.
    grants: HashMap<PrincipalKey, Grants>,

    /// The first principal resolved.
    first_principal: Option<PrincipalKey>,
}

/// Rule evaluation engine.
///
/// Evaluates rule trees against the session store, the step-up tracker, the
/// ban ledger and the grant resolver.
#[derive(Clone)]
pub struct RuleEvaluator {
    /// The session store.
    sessions: Arc<dyn SessionStore>,

    /// The grant resolver.
    resolver: Arc<dyn GrantResolver>,

    /// The step-up tracker.
    safe_zones: SafeZoneTracker,

    /// The ban ledger.
    bans: BanLedger,

    /// Deadline for one resolver call.
    resolver_timeout: Option<Duration>,

    /// Resolver calls still running on helper threads, including abandoned ones.
    resolver_in_flight: Arc<AtomicUsize>,

    /// Limit on `resolver_in_flight`.
    max_resolver_in_flight: usize,
}

impl RuleEvaluator {
    /// Create a new rule evaluator.
    ///
    /// # Arguments
    ///
    /// * `sessions` - The session store.
    /// * `resolver` - The grant resolver.
    /// * `safe_zones` - The step-up tracker.
    /// * `bans` - The ban ledger.
    ///
    /// # Returns
    ///
    /// A new rule evaluator without a resolver deadline.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        resolver: Arc<dyn GrantResolver>,
        safe_zones: SafeZoneTracker,
        bans: BanLedger,
    ) -> Self {
        Self {
            sessions,
            resolver,
            safe_zones,
            bans,
            resolver_timeout: None,
            resolver_in_flight: Arc::new(AtomicUsize::new(0)),
            max_resolver_in_flight: DEFAULT_MAX_RESOLVER_IN_FLIGHT,
        }
    }

    /// Bound every resolver call by a deadline.
    pub fn with_resolver_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.resolver_timeout = timeout;
        self
    }

    /// Get the resolver deadline.
    pub fn resolver_timeout(&self) -> Option<Duration> {
        self.resolver_timeout
    }

    /// Limit how many deadline-bounded resolver calls may run at once.
    ///
    /// A call that misses its deadline keeps its slot until the resolver
    /// returns. Once the limit is reached, further calls fail immediately
    /// with [`ResolverError::Saturated`].
    pub fn with_resolver_concurrency(mut self, max_in_flight: usize) -> Self {
        self.max_resolver_in_flight = max_in_flight.max(1);
        self
    }

    /// Get the number of deadline-bounded resolver calls still running.
    pub fn resolver_in_flight(&self) -> usize {
        self.resolver_in_flight.load(Ordering::Acquire)
    }

    /// Evaluate a rule against a request.
    ///
    /// # Arguments
    ///
    /// * `rule` - The rule to evaluate.
    /// * `ctx` - What the request carries.
    ///
    /// # Returns
    ///
    /// * `Ok(EvalResult)` - The decision and, on denial, the failed leaf.
    /// * `Err(AuthError)` - If the resolver failed or timed out.
    pub fn evaluate(&self, rule: &Rule, ctx: &RequestContext) -> Result<EvalResult, AuthError> {
        // Bypass wins before any store is consulted
        if rule.contains_bypass() {
            debug!(rule = %rule, "Bypass marker present, skipping evaluation");
            return Ok(EvalResult::allow());
        }

        let mut scratch = Scratch::default();
        let result = self.eval_node(rule, ctx, &mut scratch)?;

        Ok(result.with_principal(scratch.first_principal))
    }

    fn eval_node(
        &self,
        rule: &Rule,
        ctx: &RequestContext,
        scratch: &mut Scratch,
    ) -> Result<EvalResult, AuthError> {
        match rule {
            Rule::Bypass => Ok(EvalResult::allow()),
            Rule::All(children) => {
                for child in children {
                    let result = self.eval_node(child, ctx, scratch)?;
                    if !result.allowed {
                        return Ok(result);
                    }
                }
                Ok(EvalResult::allow())
            }
            Rule::Any(children) => {
                let mut last_failure = None;
                for child in children {
                    let result = self.eval_node(child, ctx, scratch)?;
                    if result.allowed {
                        return Ok(result);
                    }
                    last_failure = Some(result);
                }
                Ok(last_failure.unwrap_or_else(EvalResult::allow))
            }
            Rule::Not(inner) => {
                let result = self.eval_node(inner, ctx, scratch)?;
                Ok(if result.allowed {
                    EvalResult::negated()
                } else {
                    EvalResult::allow()
                })
            }
            Rule::Leaf(leaf) => self.eval_leaf(leaf, ctx, scratch),
        }
    }

    fn eval_leaf(
        &self,
        leaf: &Leaf,
        ctx: &RequestContext,
        scratch: &mut Scratch,
    ) -> Result<EvalResult, AuthError> {
        // Transport checks never touch the session store
        let passed = match leaf {
            Leaf::HttpBasic { expected } => {
                ctx.basic().is_some_and(|supplied| basic_matches(expected, supplied))
            }
            Leaf::HttpDigest { expected } => {
                ctx.digest().is_some_and(|supplied| digest_matches(expected, supplied))
            }
            Leaf::IsLoggedIn { account } => self.principal_for(account, ctx, scratch).is_some(),
            Leaf::HasRole { role, account } => {
                let Some(key) = self.principal_for(account, ctx, scratch) else {
                    return Ok(EvalResult::deny_unauthenticated(leaf.clone()));
                };
                self.check_grants(&key, scratch, |grants| grants.has_role(role))?
            }
            Leaf::HasPermission {
                permission,
                account,
            } => {
                let Some(key) = self.principal_for(account, ctx, scratch) else {
                    return Ok(EvalResult::deny_unauthenticated(leaf.clone()));
                };
                self.check_grants(&key, scratch, |grants| grants.has_permission(permission))?
            }
            Leaf::IsSafe { scope, account } => {
                let Some(key) = self.principal_for(account, ctx, scratch) else {
                    return Ok(EvalResult::deny_unauthenticated(leaf.clone()));
                };
                self.safe_zones.is_open(&key, scope)
            }
            Leaf::IsNotBanned { service, account } => {
                let Some(key) = self.principal_for(account, ctx, scratch) else {
                    return Ok(EvalResult::deny_unauthenticated(leaf.clone()));
                };
                !self.bans.is_banned(&key, service)
            }
        };

        Ok(if passed {
            EvalResult::allow()
        } else {
            EvalResult::deny(leaf.clone())
        })
    }

    /// Resolve the principal behind the request's token for an account type.
    fn principal_for(
        &self,
        account: &AccountType,
        ctx: &RequestContext,
        scratch: &mut Scratch,
    ) -> Option<PrincipalKey> {
        if let Some(cached) = scratch.principals.get(account) {
            return cached.clone();
        }

        let resolved = ctx.token_for(account).and_then(|token| {
            let key = match self.sessions.lookup(token) {
                Ok(session) => session.principal_key().clone(),
                Err(err) => {
                    debug!(account = %account, token = %token.redacted(), error = %err, "Token did not resolve");
                    return None;
                }
            };

            // A token issued under another account type does not count
            if &key.account_type != account {
                debug!(account = %account, issued_for = %key.account_type, "Token belongs to another account type");
                return None;
            }

            self.sessions.touch(token);
            Some(key)
        });

        if scratch.first_principal.is_none() {
            scratch.first_principal = resolved.clone();
        }
        scratch.principals.insert(account.clone(), resolved.clone());
        resolved
    }

    /// Apply a check to a principal's grants, fetching them on first use.
    fn check_grants<F>(
        &self,
        key: &PrincipalKey,
        scratch: &mut Scratch,
        check: F,
    ) -> Result<bool, AuthError>
    where
        F: FnOnce(&Grants) -> bool,
    {
        if !scratch.grants.contains_key(key) {
            let grants = self.resolve_grants(key)?;
            scratch.grants.insert(key.clone(), grants);
        }

        Ok(scratch.grants.get(key).is_some_and(check))
    }

    fn resolve_grants(&self, key: &PrincipalKey) -> Result<Grants, AuthError> {
        let started = Instant::now();

        let result = match self.resolver_timeout {
            Some(timeout) => self.resolve_with_deadline(key, timeout),
            None => self.resolver.resolve(key).map_err(AuthError::from),
        };

        match &result {
            Ok(grants) => debug!(
                principal = %key,
                roles = grants.roles.len(),
                permissions = grants.permissions.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "Resolved grants"
            ),
            Err(err) => warn!(principal = %key, error = %err, "Grant resolution failed"),
        }
        result
    }

    /// Run the resolver on a helper thread and wait at most `timeout`.
    ///
    /// A resolver that misses the deadline keeps running on its thread and
    /// holds its in-flight slot until it returns; its answer is discarded.
    fn resolve_with_deadline(
        &self,
        key: &PrincipalKey,
        timeout: Duration,
    ) -> Result<Grants, AuthError> {
        let slot = InFlightSlot::acquire(&self.resolver_in_flight, self.max_resolver_in_flight)
            .ok_or(ResolverError::Saturated(self.max_resolver_in_flight))?;

        let (tx, rx) = bounded(1);
        let resolver = Arc::clone(&self.resolver);
        let principal = key.clone();

        thread::Builder::new()
            .name(RESOLVER_THREAD_NAME.to_string())
            .spawn(move || {
                let _slot = slot;
                // The receiver is gone if the caller already gave up
                let _ = tx.send(resolver.resolve(&principal));
            })
            .map_err(|e| ResolverError::backend("failed to spawn resolver thread", e))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result.map_err(AuthError::from),
            Err(RecvTimeoutError::Timeout) => {
                Err(AuthError::ResolverTimeout(timeout.as_millis() as u64))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ResolverError::Abandoned.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::error::AuthErrorKind;
    use warden_core::id::Token;
    use warden_core::traits::{FnResolver, StaticGrantResolver};
    use warden_core::types::{BasicCredentials, Principal};
    use warden_store::InMemorySessionStore;

    struct Fixture {
        sessions: Arc<InMemorySessionStore>,
        resolver: Arc<StaticGrantResolver>,
        evaluator: RuleEvaluator,
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(InMemorySessionStore::new());
        let resolver = Arc::new(StaticGrantResolver::new());
        let evaluator = RuleEvaluator::new(
            sessions.clone(),
            resolver.clone(),
            SafeZoneTracker::new(),
            BanLedger::new(),
        );
        Fixture {
            sessions,
            resolver,
            evaluator,
        }
    }

    fn login(fixture: &Fixture, id: &str, roles: &[&str], permissions: &[&str]) -> Token {
        let principal = Principal::with_default_account(id);
        fixture.resolver.insert(
            principal.key().clone(),
            Grants::new(roles.iter().copied(), permissions.iter().copied()),
        );
        fixture.sessions.create(principal, None).unwrap()
    }

    #[test]
    fn test_wildcard_permission() {
        let f = fixture();
        let token = login(&f, "U1", &[], &["*"]);
        let ctx = RequestContext::anonymous().with_token(token);

        for permission in ["user.add", "order.delete", "", "anything at all"] {
            let result = f.evaluator.evaluate(&Rule::permission(permission), &ctx).unwrap();
            assert!(result.allowed, "permission {:?}", permission);
        }
    }

    #[test]
    fn test_prefix_wildcard() {
        let f = fixture();
        let token = login(&f, "U1", &[], &["user.*"]);
        let ctx = RequestContext::anonymous().with_token(token);

        assert!(f.evaluator.evaluate(&Rule::permission("user.add"), &ctx).unwrap().allowed);
        assert!(f.evaluator.evaluate(&Rule::permission("user.delete"), &ctx).unwrap().allowed);
        assert!(!f.evaluator.evaluate(&Rule::permission("order.add"), &ctx).unwrap().allowed);
    }

    #[test]
    fn test_all_reports_first_failure() {
        let f = fixture();
        let token = login(&f, "U1", &["admin"], &[]);
        let ctx = RequestContext::anonymous().with_token(token);

        let rule = Rule::all([
            Rule::role("admin"),
            Rule::permission("x"),
            Rule::permission("y"),
        ]);
        let result = f.evaluator.evaluate(&rule, &ctx).unwrap();
        assert!(!result.allowed);

        let err = result.to_error().unwrap();
        assert_eq!(err.kind(), AuthErrorKind::MissingPermission);
        assert_eq!(err.scope_or_key(), Some("x"));
    }

    #[test]
    fn test_any_success_and_last_failure() {
        let f = fixture();
        let token = login(&f, "U1", &["admin"], &[]);
        let ctx = RequestContext::anonymous().with_token(token);

        let rule = Rule::any([Rule::permission("user.add"), Rule::role("admin")]);
        assert!(f.evaluator.evaluate(&rule, &ctx).unwrap().allowed);

        let rule = Rule::any([Rule::role("ops"), Rule::permission("a"), Rule::permission("b")]);
        let err = f.evaluator.evaluate(&rule, &ctx).unwrap().to_error().unwrap();
        assert_eq!(err.kind(), AuthErrorKind::MissingPermission);
        assert_eq!(err.scope_or_key(), Some("b"));
    }

    #[test]
    fn test_empty_combinators_allow() {
        let f = fixture();
        let ctx = RequestContext::anonymous();
        assert!(f.evaluator.evaluate(&Rule::all([]), &ctx).unwrap().allowed);
        assert!(f.evaluator.evaluate(&Rule::any([]), &ctx).unwrap().allowed);
    }

    #[test]
    fn test_not() {
        let f = fixture();
        let token = login(&f, "U1", &["guest"], &[]);
        let ctx = RequestContext::anonymous().with_token(token);

        let result = f.evaluator.evaluate(&Rule::not(Rule::role("guest")), &ctx).unwrap();
        assert!(!result.allowed);
        assert_eq!(result.failed_leaf, None);
        assert_eq!(result.to_error().unwrap().kind(), AuthErrorKind::Negated);

        assert!(f.evaluator.evaluate(&Rule::not(Rule::role("admin")), &ctx).unwrap().allowed);
    }

    #[test]
    fn test_anonymous_principal_leaf_is_not_logged_in() {
        let f = fixture();
        let ctx = RequestContext::anonymous();

        let result = f.evaluator.evaluate(&Rule::role("admin"), &ctx).unwrap();
        assert!(result.unauthenticated);
        assert_eq!(result.to_error().unwrap().kind(), AuthErrorKind::NotLoggedIn);
    }

    #[test]
    fn test_unknown_token_is_not_logged_in() {
        let f = fixture();
        let ctx = RequestContext::anonymous().with_token("forged");
        let err = f.evaluator.evaluate(&Rule::logged_in(), &ctx).unwrap().to_error().unwrap();
        assert_eq!(err.kind(), AuthErrorKind::NotLoggedIn);
    }

    #[test]
    fn test_token_under_wrong_account_type_does_not_count() {
        let f = fixture();
        let staff = f
            .sessions
            .create(Principal::new("staff", "U1"), None)
            .unwrap();
        let ctx = RequestContext::anonymous().with_account_token("customer", staff.clone());
        let before = f.sessions.lookup(&staff).unwrap().last_active_at;
        thread::sleep(Duration::from_millis(20));

        assert!(!f.evaluator.evaluate(&Rule::logged_in_as("customer"), &ctx).unwrap().allowed);

        // A rejected token is not treated as activity
        assert_eq!(f.sessions.lookup(&staff).unwrap().last_active_at, before);

        let ctx = RequestContext::anonymous().with_account_token("staff", staff.clone());
        assert!(f.evaluator.evaluate(&Rule::logged_in_as("staff"), &ctx).unwrap().allowed);
        assert!(f.sessions.lookup(&staff).unwrap().last_active_at > before);
    }

    #[test]
    fn test_resolver_called_once_per_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sessions = Arc::new(InMemorySessionStore::new());
        let evaluator = RuleEvaluator::new(
            sessions.clone(),
            Arc::new(FnResolver::new(move |_: &PrincipalKey| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Grants::new(["admin"], ["user.add", "user.update"]))
            })),
            SafeZoneTracker::new(),
            BanLedger::new(),
        );
        let token = sessions
            .create(Principal::with_default_account("U1"), None)
            .unwrap();
        let ctx = RequestContext::anonymous().with_token(token);

        let rule = Rule::all([
            Rule::logged_in(),
            Rule::role("admin"),
            Rule::permission("user.add"),
            Rule::any([Rule::permission("user.update"), Rule::role("ops")]),
        ]);
        assert!(evaluator.evaluate(&rule, &ctx).unwrap().allowed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // No grant leaves, no resolver call
        let rule = Rule::all([Rule::logged_in(), Rule::not_banned("comment")]);
        assert!(evaluator.evaluate(&rule, &ctx).unwrap().allowed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolver_not_called_when_short_circuited() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let evaluator = RuleEvaluator::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(FnResolver::new(move |_: &PrincipalKey| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Grants::none())
            })),
            SafeZoneTracker::new(),
            BanLedger::new(),
        );

        let rule = Rule::all([Rule::logged_in(), Rule::role("admin")]);
        let result = evaluator.evaluate(&rule, &RequestContext::anonymous()).unwrap();
        assert!(!result.allowed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_resolver_error_aborts() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let evaluator = RuleEvaluator::new(
            sessions.clone(),
            Arc::new(StaticGrantResolver::strict()),
            SafeZoneTracker::new(),
            BanLedger::new(),
        );
        let token = sessions
            .create(Principal::with_default_account("U1"), None)
            .unwrap();
        let ctx = RequestContext::anonymous().with_token(token);

        // Even under Any, a resolver failure is not treated as a denial
        let rule = Rule::any([Rule::role("admin"), Rule::logged_in()]);
        let err = evaluator.evaluate(&rule, &ctx).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::ResolverError);
        assert!(!err.is_denial());
    }

    #[test]
    fn test_resolver_timeout() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let evaluator = RuleEvaluator::new(
            sessions.clone(),
            Arc::new(FnResolver::new(|_: &PrincipalKey| {
                thread::sleep(Duration::from_millis(500));
                Ok(Grants::new(["admin"], Vec::<String>::new()))
            })),
            SafeZoneTracker::new(),
            BanLedger::new(),
        )
        .with_resolver_timeout(Some(Duration::from_millis(50)));
        let token = sessions
            .create(Principal::with_default_account("U1"), None)
            .unwrap();
        let ctx = RequestContext::anonymous().with_token(token);

        let started = Instant::now();
        let err = evaluator.evaluate(&Rule::role("admin"), &ctx).unwrap_err();
        assert!(matches!(err, AuthError::ResolverTimeout(50)));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_resolver_concurrency_is_bounded() {
        let (release, gate) = crossbeam_channel::unbounded::<()>();
        let sessions = Arc::new(InMemorySessionStore::new());
        let evaluator = RuleEvaluator::new(
            sessions.clone(),
            Arc::new(FnResolver::new(move |_: &PrincipalKey| {
                // Hangs until the sender is dropped
                let _ = gate.recv();
                Ok(Grants::new(["admin"], Vec::<String>::new()))
            })),
            SafeZoneTracker::new(),
            BanLedger::new(),
        )
        .with_resolver_timeout(Some(Duration::from_millis(20)))
        .with_resolver_concurrency(2);
        let token = sessions
            .create(Principal::with_default_account("U1"), None)
            .unwrap();
        let ctx = RequestContext::anonymous().with_token(token);
        let rule = Rule::role("admin");

        for _ in 0..2 {
            let err = evaluator.evaluate(&rule, &ctx).unwrap_err();
            assert!(matches!(err, AuthError::ResolverTimeout(20)));
        }
        assert_eq!(evaluator.resolver_in_flight(), 2);

        // No new thread while the abandoned calls still run
        let err = evaluator.evaluate(&rule, &ctx).unwrap_err();
        assert!(matches!(err, AuthError::Resolver(ResolverError::Saturated(2))));
        assert!(!err.is_denial());
        assert_eq!(evaluator.resolver_in_flight(), 2);

        drop(release);
        let deadline = Instant::now() + Duration::from_secs(2);
        while evaluator.resolver_in_flight() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(evaluator.resolver_in_flight(), 0);
        assert!(evaluator.evaluate(&rule, &ctx).unwrap().allowed);
    }

    #[test]
    fn test_resolver_within_deadline() {
        let f = fixture();
        let evaluator = f
            .evaluator
            .clone()
            .with_resolver_timeout(Some(Duration::from_secs(5)));
        let token = login(&f, "U1", &["admin"], &[]);
        let ctx = RequestContext::anonymous().with_token(token);

        assert!(evaluator.evaluate(&Rule::role("admin"), &ctx).unwrap().allowed);
    }

    #[test]
    fn test_http_basic_needs_no_session() {
        let f = fixture();
        let rule = Rule::http_basic(BasicCredentials::new("sa", "123456"));

        let ctx = RequestContext::anonymous().with_basic(BasicCredentials::new("sa", "123456"));
        assert!(f.evaluator.evaluate(&rule, &ctx).unwrap().allowed);

        let ctx = RequestContext::anonymous().with_basic(BasicCredentials::new("sa", "nope"));
        let err = f.evaluator.evaluate(&rule, &ctx).unwrap().to_error().unwrap();
        assert_eq!(err.kind(), AuthErrorKind::BadCredentials);

        let err = f
            .evaluator
            .evaluate(&rule, &RequestContext::anonymous())
            .unwrap()
            .to_error()
            .unwrap();
        assert_eq!(err.kind(), AuthErrorKind::BadCredentials);
    }

    #[test]
    fn test_result_names_principal() {
        let f = fixture();
        let token = login(&f, "U1", &[], &[]);
        let ctx = RequestContext::anonymous().with_token(token);

        let result = f.evaluator.evaluate(&Rule::logged_in(), &ctx).unwrap();
        assert_eq!(result.principal, Some(PrincipalKey::with_default_account("U1")));
    }
}
