//! Guard dispatcher.
//!
//! The guard is invoked before a guarded operation runs. It evaluates the
//! operation's rule, logs the decision, records it in the audit log when one
//! is attached, and turns a denial into an [`AuthError`].

use std::sync::Arc;
use tracing::{debug, warn};

use warden_core::error::AuthError;

use crate::engine::audit::{AuditEntry, AuditLog};
use crate::engine::evaluator::RuleEvaluator;
use crate::model::{EvalResult, RequestContext, Rule};

/// Entry point for guarded operations.
#[derive(Clone)]
pub struct GuardDispatcher {
    /// The rule evaluator.
    evaluator: RuleEvaluator,

    /// Optional audit log.
    audit: Option<Arc<AuditLog>>,
}

impl GuardDispatcher {
    /// Create a new guard dispatcher.
    pub fn new(evaluator: RuleEvaluator) -> Self {
        Self {
            evaluator,
            audit: None,
        }
    }

    /// Record every decision in an audit log.
    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Get the rule evaluator.
    pub fn evaluator(&self) -> &RuleEvaluator {
        &self.evaluator
    }

    /// Get the audit log, if one is attached.
    pub fn audit_log(&self) -> Option<&Arc<AuditLog>> {
        self.audit.as_ref()
    }

    /// Check a rule against a request.
    ///
    /// # Arguments
    ///
    /// * `rule` - The rule guarding the operation.
    /// * `ctx` - What the request carries.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the operation may run.
    /// * `Err(AuthError)` - Naming the one check that failed, or the resolver failure.
    pub fn guard(&self, rule: &Rule, ctx: &RequestContext) -> Result<(), AuthError> {
        self.dispatch(None, rule, ctx).1
    }

    /// Check a rule on behalf of a named operation.
    pub fn guard_named(
        &self,
        operation: &str,
        rule: &Rule,
        ctx: &RequestContext,
    ) -> Result<(), AuthError> {
        self.dispatch(Some(operation), rule, ctx).1
    }

    /// Check a rule and also return the full evaluation result.
    ///
    /// The result is `None` when the resolver failed.
    pub fn guard_detailed(
        &self,
        rule: &Rule,
        ctx: &RequestContext,
    ) -> (Option<EvalResult>, Result<(), AuthError>) {
        self.dispatch(None, rule, ctx)
    }

    fn dispatch(
        &self,
        operation: Option<&str>,
        rule: &Rule,
        ctx: &RequestContext,
    ) -> (Option<EvalResult>, Result<(), AuthError>) {
        let (result, decision) = match self.evaluator.evaluate(rule, ctx) {
            Ok(result) => {
                let decision = match result.to_error() {
                    Some(err) => Err(err),
                    None => Ok(()),
                };
                (Some(result), decision)
            }
            Err(err) => (None, Err(err)),
        };

        let op = operation.unwrap_or("-");
        match &decision {
            Ok(()) => debug!(operation = op, rule = %rule, "Guard allowed"),
            Err(err) if err.is_denial() => warn!(
                operation = op,
                kind = %err.kind(),
                key = err.scope_or_key().unwrap_or("-"),
                "Guard denied"
            ),
            Err(err) => warn!(operation = op, error = %err, "Guard could not decide"),
        }

        if let Some(audit) = &self.audit {
            let principal = result.as_ref().and_then(|r| r.principal.clone());
            audit.record(AuditEntry::new(principal, operation, rule, &decision));
        }

        (result, decision)
    }
}
