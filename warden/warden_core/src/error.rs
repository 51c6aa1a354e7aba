//! Error types for the Warden authorization core.
//!
//! Each subsystem has its own error type. The root error type, [`Error`],
//! wraps all of them so that embedding code can handle failures uniformly.
//!
//! Absence is never an error: looking up an unknown token, an unknown safe
//! zone or an unknown ban yields `None`/`false`. The only structured output
//! of a denied guard is an [`AuthError`].

use crate::id::AccountType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Root error type for Warden.
#[derive(Debug, Error)]
pub enum Error {
    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Authorization denials and resolver failures
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The principal handed to `create` is unusable
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    /// No session is bound to the token
    #[error("Token not found")]
    TokenNotFound,

    /// The session bound to the token has expired
    #[error("Session expired")]
    SessionExpired,
}

/// Errors raised by a grant resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The resolver has no record of the principal
    #[error("Unknown principal: {0}")]
    UnknownPrincipal(String),

    /// The resolver backend failed
    #[error("Resolver backend failure: {message}")]
    Backend {
        /// Human-readable description of the failure
        message: String,

        /// The underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The resolver call panicked or was dropped before answering
    #[error("Resolver call was abandoned")]
    Abandoned,

    /// Too many deadline-bounded resolver calls are still running
    #[error("Too many resolver calls in flight (limit {0})")]
    Saturated(usize),
}

impl ResolverError {
    /// Create a backend error with an attached cause.
    pub fn backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a backend error without a cause.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// The outward-facing category of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// No usable session for the required account type
    NotLoggedIn,
    /// A required role is missing
    MissingRole,
    /// A required permission is missing
    MissingPermission,
    /// No open safe zone for the required scope
    NotElevated,
    /// The principal is banned from the service
    ServiceBanned,
    /// Transport credentials did not match
    BadCredentials,
    /// A negated rule matched
    Negated,
    /// The resolver did not answer before the deadline
    ResolverTimeout,
    /// The resolver failed
    ResolverError,
}

impl AuthErrorKind {
    /// Get the snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotLoggedIn => "not_logged_in",
            Self::MissingRole => "missing_role",
            Self::MissingPermission => "missing_permission",
            Self::NotElevated => "not_elevated",
            Self::ServiceBanned => "service_banned",
            Self::BadCredentials => "bad_credentials",
            Self::Negated => "negated",
            Self::ResolverTimeout => "resolver_timeout",
            Self::ResolverError => "resolver_error",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guard denial, or a failure that prevented the guard from deciding.
///
/// Token lookup failures (`TokenNotFound`, `SessionExpired`) are collapsed
/// into [`AuthError::NotLoggedIn`] so callers cannot tell which one happened.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable session for the account type
    #[error("Not logged in (account type '{account_type}')")]
    NotLoggedIn {
        /// The account type that required a session
        account_type: AccountType,
    },

    /// The principal lacks a role
    #[error("Missing role: {role}")]
    MissingRole {
        /// The role that was required
        role: String,
    },

    /// The principal lacks a permission
    #[error("Missing permission: {permission}")]
    MissingPermission {
        /// The permission code that was required
        permission: String,
    },

    /// The principal has no open safe zone for the scope
    #[error("Not elevated for scope: {scope}")]
    NotElevated {
        /// The safe-zone scope that was required
        scope: String,
    },

    /// The principal is banned from the service
    #[error("Service banned: {service}")]
    ServiceBanned {
        /// The banned service key
        service: String,
    },

    /// Transport credentials were missing or did not match
    #[error("Bad credentials")]
    BadCredentials,

    /// A negated rule was satisfied
    #[error("Denied by negated rule")]
    Negated,

    /// The resolver did not answer within the deadline
    #[error("Resolver timed out after {0}ms")]
    ResolverTimeout(u64),

    /// The resolver failed
    #[error("Resolver failed: {0}")]
    Resolver(#[from] ResolverError),
}

impl AuthError {
    /// Get the outward-facing category of this error.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::NotLoggedIn { .. } => AuthErrorKind::NotLoggedIn,
            Self::MissingRole { .. } => AuthErrorKind::MissingRole,
            Self::MissingPermission { .. } => AuthErrorKind::MissingPermission,
            Self::NotElevated { .. } => AuthErrorKind::NotElevated,
            Self::ServiceBanned { .. } => AuthErrorKind::ServiceBanned,
            Self::BadCredentials => AuthErrorKind::BadCredentials,
            Self::Negated => AuthErrorKind::Negated,
            Self::ResolverTimeout(_) => AuthErrorKind::ResolverTimeout,
            Self::Resolver(_) => AuthErrorKind::ResolverError,
        }
    }

    /// Get the role, permission, scope, service key or account type the
    /// failing check was about, if it had one.
    pub fn scope_or_key(&self) -> Option<&str> {
        match self {
            Self::NotLoggedIn { account_type } => Some(account_type.as_str()),
            Self::MissingRole { role } => Some(role),
            Self::MissingPermission { permission } => Some(permission),
            Self::NotElevated { scope } => Some(scope),
            Self::ServiceBanned { service } => Some(service),
            Self::BadCredentials
            | Self::Negated
            | Self::ResolverTimeout(_)
            | Self::Resolver(_) => None,
        }
    }

    /// Check if this error is a denial rather than a resolver failure.
    pub fn is_denial(&self) -> bool {
        !matches!(self, Self::ResolverTimeout(_) | Self::Resolver(_))
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// The configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The configuration is well-formed but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for Warden operations.
pub type Result<T> = std::result::Result<T, Error>;
