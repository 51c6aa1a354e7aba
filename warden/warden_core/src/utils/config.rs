//! Configuration for Warden.
//!
//! [`WardenConfig`] is loaded from TOML. Every field has a default, so an
//! empty file (or no file at all) yields a working configuration.
//!
//! ```toml
//! token_style = "random-64"
//! session_timeout_secs = 86400
//! reaper_enabled = false
//! idle_timeout_secs = 1800
//! concurrent_login = false
//! resolver_timeout_ms = 250
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::utils::LogLevel;

/// How session tokens are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenStyle {
    /// A hyphenated UUID v4.
    Uuid,

    /// A UUID v4 without hyphens.
    SimpleUuid,

    /// 32 random URL-safe characters.
    Random32,

    /// 64 random URL-safe characters.
    Random64,

    /// 128 random URL-safe characters.
    Random128,
}

impl TokenStyle {
    /// Get the kebab-case name of this style.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::SimpleUuid => "simple-uuid",
            Self::Random32 => "random-32",
            Self::Random64 => "random-64",
            Self::Random128 => "random-128",
        }
    }
}

impl Default for TokenStyle {
    fn default() -> Self {
        Self::Random64
    }
}

impl FromStr for TokenStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uuid" => Ok(Self::Uuid),
            "simple-uuid" => Ok(Self::SimpleUuid),
            "random-32" => Ok(Self::Random32),
            "random-64" => Ok(Self::Random64),
            "random-128" => Ok(Self::Random128),
            other => Err(ConfigError::Invalid(format!("unknown token style '{}'", other))),
        }
    }
}

impl fmt::Display for TokenStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warden configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Token generation style
    #[serde(default)]
    pub token_style: TokenStyle,

    /// Session lifetime in seconds; absent means sessions last until logout
    #[serde(default)]
    pub session_timeout_secs: Option<u64>,

    /// Idle timeout in seconds; absent disables idle expiry
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,

    /// Whether a principal may hold several sessions at once
    #[serde(default = "default_concurrent_login")]
    pub concurrent_login: bool,

    /// Upper bound on sessions per principal when concurrent login is on
    #[serde(default)]
    pub max_sessions_per_principal: Option<usize>,

    /// Default safe-zone lifetime in seconds
    #[serde(default = "default_safe_ttl_secs")]
    pub default_safe_ttl_secs: u64,

    /// Deadline for one resolver call in milliseconds; absent waits forever
    #[serde(default)]
    pub resolver_timeout_ms: Option<u64>,

    /// Upper bound on deadline-bounded resolver calls running at once
    #[serde(default = "default_resolver_max_in_flight")]
    pub resolver_max_in_flight: usize,

    /// Whether the background reaper runs
    #[serde(default = "default_reaper_enabled")]
    pub reaper_enabled: bool,

    /// Reaper period in seconds
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Decisions kept per principal in the audit log; zero disables auditing
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,

    /// Seconds after its last decision before a principal's audit history is dropped
    #[serde(default = "default_audit_retention_secs")]
    pub audit_retention_secs: u64,

    /// Upper bound on principals with an audit history
    #[serde(default = "default_audit_max_principals")]
    pub audit_max_principals: usize,

    /// Log level used by the CLI when `RUST_LOG` is unset
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_concurrent_login() -> bool {
    true
}

fn default_safe_ttl_secs() -> u64 {
    120
}

fn default_reaper_enabled() -> bool {
    true
}

fn default_reaper_interval_secs() -> u64 {
    60
}

fn default_audit_capacity() -> usize {
    100
}

fn default_resolver_max_in_flight() -> usize {
    32
}

fn default_audit_retention_secs() -> u64 {
    3600
}

fn default_audit_max_principals() -> usize {
    10_000
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            token_style: TokenStyle::default(),
            session_timeout_secs: None,
            idle_timeout_secs: None,
            concurrent_login: default_concurrent_login(),
            max_sessions_per_principal: None,
            default_safe_ttl_secs: default_safe_ttl_secs(),
            resolver_timeout_ms: None,
            resolver_max_in_flight: default_resolver_max_in_flight(),
            reaper_enabled: default_reaper_enabled(),
            reaper_interval_secs: default_reaper_interval_secs(),
            audit_capacity: default_audit_capacity(),
            audit_retention_secs: default_audit_retention_secs(),
            audit_max_principals: default_audit_max_principals(),
            log_level: LogLevel::default(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: the defaults are returned and a
    /// warning is logged.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Configuration file not found: {}", path.display());
            return Ok(Self::default());
        }

        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadFailed(format!("{}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "session_timeout_secs cannot be zero".to_string(),
            ));
        }

        if self.idle_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "idle_timeout_secs cannot be zero".to_string(),
            ));
        }

        if self.max_sessions_per_principal == Some(0) {
            return Err(ConfigError::Invalid(
                "max_sessions_per_principal cannot be zero".to_string(),
            ));
        }

        if self.default_safe_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "default_safe_ttl_secs cannot be zero".to_string(),
            ));
        }

        if self.resolver_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "resolver_timeout_ms cannot be zero".to_string(),
            ));
        }

        if self.resolver_max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "resolver_max_in_flight cannot be zero".to_string(),
            ));
        }

        if self.audit_retention_secs == 0 {
            return Err(ConfigError::Invalid(
                "audit_retention_secs cannot be zero".to_string(),
            ));
        }

        if self.audit_max_principals == 0 {
            return Err(ConfigError::Invalid(
                "audit_max_principals cannot be zero".to_string(),
            ));
        }

        if self.reaper_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reaper_interval_secs cannot be zero".to_string(),
            ));
        }

        if !self.concurrent_login && self.max_sessions_per_principal.is_some() {
            warn!("max_sessions_per_principal has no effect when concurrent_login is false");
        }

        Ok(())
    }

    /// Session lifetime as a duration.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_secs.map(Duration::from_secs)
    }

    /// Idle timeout as a duration.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    /// Default safe-zone lifetime as a duration.
    pub fn default_safe_ttl(&self) -> Duration {
        Duration::from_secs(self.default_safe_ttl_secs)
    }

    /// Resolver deadline as a duration.
    pub fn resolver_timeout(&self) -> Option<Duration> {
        self.resolver_timeout_ms.map(Duration::from_millis)
    }

    /// Audit retention as a duration.
    pub fn audit_retention(&self) -> Duration {
        Duration::from_secs(self.audit_retention_secs)
    }

    /// Reaper period as a duration, or `None` if the reaper is disabled.
    pub fn reaper_interval(&self) -> Option<Duration> {
        self.reaper_enabled
            .then(|| Duration::from_secs(self.reaper_interval_secs))
    }
}
