//! Error handling for the Warden policy layer.

use thiserror::Error;

use warden_core::error::{AuthError, ConfigError, SessionError};

/// Errors raised by the [`Warden`](crate::Warden) façade.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No guarded operation is registered under the name
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The guard denied the request or could not decide
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A session could not be created
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A background thread could not be started
    #[error("Failed to start background thread: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PolicyError> for warden_core::Error {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Auth(err) => Self::Auth(err),
            PolicyError::Session(err) => Self::Session(err),
            PolicyError::Config(err) => Self::Config(err),
            PolicyError::Io(err) => Self::Io(err),
            PolicyError::UnknownOperation(name) => {
                Self::Config(ConfigError::Invalid(format!("unknown operation '{}'", name)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core_error() {
        let err: warden_core::Error = PolicyError::Auth(AuthError::BadCredentials).into();
        assert!(matches!(err, warden_core::Error::Auth(AuthError::BadCredentials)));

        let err: warden_core::Error = PolicyError::UnknownOperation("x".to_string()).into();
        assert!(matches!(err, warden_core::Error::Config(ConfigError::Invalid(_))));
    }
}
