//! # Warden Core
//!
//! `warden_core` provides the building blocks shared by every part of the
//! Warden authorization core: identifiers, the principal and session data
//! model, transport credential types, the grant resolver interface, the
//! error hierarchy and configuration.
//!
//! ## Model
//!
//! Warden answers one question: *is this principal allowed to perform this
//! guarded operation right now?* The answer depends on four pieces of state:
//!
//! 1. **Sessions**: which tokens are bound to which principals.
//! 2. **Grants**: which roles and permission codes a principal holds, supplied
//!    on demand by an integrator-provided [`GrantResolver`].
//! 3. **Safe zones**: time-boxed elevated-trust windows opened after a
//!    secondary verification.
//! 4. **Bans**: per-service disablement records.
//!
//! A principal is identified by its [`PrincipalKey`], the pair of an
//! [`AccountType`] and an opaque id. Independent login systems ("staff",
//! "customer") never share records even when ids collide.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all Warden components
//! - **id**: Account types, principal keys and tokens
//! - **traits**: The grant resolver interface and stock implementations
//! - **types**: Principal, session, grants and credential structures
//! - **utils**: Configuration, log levels and deadline helpers

pub mod error;
pub mod id;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export key types and traits for convenience
pub use error::{AuthError, AuthErrorKind, ConfigError, Error, ResolverError, Result, SessionError};
pub use id::{AccountType, PrincipalKey, Token, DEFAULT_ACCOUNT_TYPE, GLOBAL_SCOPE};
pub use traits::{FnResolver, GrantResolver, StaticGrantResolver};
pub use types::{
    BasicCredentials, DigestExpectation, DigestResponse, Grants, Principal, Session,
};
pub use utils::{LogLevel, TokenStyle, WardenConfig};
