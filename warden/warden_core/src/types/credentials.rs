//! Transport credential types.
//!
//! Warden never parses transport headers. The surrounding request layer
//! extracts the Basic pair or the Digest response fields and hands them over
//! in these structures; Warden only compares them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A username/password pair as carried by HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    /// The username.
    pub username: String,

    /// The password.
    pub password: String,
}

impl BasicCredentials {
    /// Create a new credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse the `username:password` form. The password may contain `:`.
    pub fn from_pair(pair: &str) -> Option<Self> {
        let (username, password) = pair.split_once(':')?;
        Some(Self::new(username, password))
    }

    /// Render the `username:password` form.
    pub fn to_pair(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The fields of a Digest authentication response supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestResponse {
    /// The username the client claims.
    pub username: String,

    /// The protection realm.
    pub realm: String,

    /// The server nonce the response was computed against.
    pub nonce: String,

    /// The request URI.
    pub uri: String,

    /// The request method.
    pub method: String,

    /// The client's response hash, lowercase hex.
    pub response: String,
}

/// The server-side expectation for a Digest check.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestExpectation {
    /// The expected username.
    pub username: String,

    /// The expected realm.
    pub realm: String,

    /// The password the response must have been computed with.
    pub password: String,
}

impl DigestExpectation {
    /// Create a new expectation.
    pub fn new(
        username: impl Into<String>,
        realm: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            realm: realm.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for DigestExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestExpectation")
            .field("username", &self.username)
            .field("realm", &self.realm)
            .field("password", &"<redacted>")
            .finish()
    }
}
