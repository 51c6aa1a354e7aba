//! # Warden Policy
//!
//! `warden_policy` decides whether a request may perform a guarded
//! operation.
//!
//! Key concepts:
//!
//! 1. **Rule**: an immutable tree of checks combined with `All`, `Any` and
//!    `Not`, plus the `Bypass` marker that overrides everything else.
//!
//! 2. **Rule Evaluator**: evaluates a rule against the request's sessions,
//!    the principal's grants, open safe zones and bans.
//!
//! 3. **Guard Dispatcher**: the entry point called before an operation runs;
//!    turns a denial into a typed [`AuthError`](warden_core::AuthError).
//!
//! 4. **Warden**: the façade that owns every stateful component.
//!
//! # Examples
//!
//! ```
//! use warden_core::{Grants, Principal, PrincipalKey, StaticGrantResolver, WardenConfig};
//! use warden_policy::{RequestContext, Rule, Warden};
//!
//! let resolver = StaticGrantResolver::new();
//! resolver.insert(
//!     PrincipalKey::with_default_account("U1"),
//!     Grants::new(["editor"], ["user.add"]),
//! );
//!
//! let config = WardenConfig { reaper_enabled: false, ..WardenConfig::default() };
//! let warden = Warden::new(config, resolver).unwrap();
//! let token = warden.login(Principal::with_default_account("U1")).unwrap();
//! let ctx = RequestContext::anonymous().with_token(token);
//!
//! assert!(warden.guard(&Rule::permission("user.add"), &ctx).is_ok());
//! assert!(warden.guard(&Rule::permission("user.delete"), &ctx).is_err());
//! ```

pub mod engine;
pub mod error;
pub mod model;
pub mod warden;

// Re-export key types for convenience
pub use engine::{
    AuditEntry, AuditLog, GuardDispatcher, GuardedOperation, OperationRegistry, RuleEvaluator,
};
pub use error::PolicyError;
pub use model::{EvalResult, Leaf, RequestContext, Rule};
pub use warden::Warden;
