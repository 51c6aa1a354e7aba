//! Rule evaluation engine.
//!
//! This module provides the evaluator, the guard dispatcher built on it,
//! the decision audit log and the registry of guarded operations.

mod audit;
pub mod credentials;
mod evaluator;
mod guard;
mod registry;

pub use audit::{AuditEntry, AuditLog};
pub use evaluator::RuleEvaluator;
pub use guard::GuardDispatcher;
pub use registry::{GuardedOperation, OperationRegistry};
