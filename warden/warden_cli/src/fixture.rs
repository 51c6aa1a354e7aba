//! Fixture files for the demo commands.
//!
//! A fixture is a TOML document holding a `[config]` table, the principals
//! known to the resolver, the operations to register and, for the `scenario`
//! command, a list of steps.
//!
//! ```toml
//! [config]
//! reaper_enabled = false
//!
//! [[principals]]
//! id = "U1"
//! permissions = ["user.add", "user.update"]
//!
//! [[operations]]
//! name = "add-user"
//! rule = { all = [{ check = "is_logged_in" }, { check = "has_permission", permission = "user.add" }] }
//!
//! [[steps]]
//! action = "login"
//! principal = "U1"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use warden_core::id::{AccountType, PrincipalKey, DEFAULT_ACCOUNT_TYPE};
use warden_core::traits::StaticGrantResolver;
use warden_core::types::Grants;
use warden_core::utils::{LogLevel, WardenConfig};
use warden_policy::{GuardedOperation, Rule, Warden};

/// A parsed fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub config: WardenConfig,

    #[serde(default)]
    pub principals: Vec<PrincipalFixture>,

    #[serde(default)]
    pub operations: Vec<GuardedOperation>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A principal and the grants the resolver reports for it.
#[derive(Debug, Clone, Deserialize)]
pub struct PrincipalFixture {
    pub id: String,

    #[serde(default = "default_account")]
    pub account: String,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub permissions: Vec<String>,
}

impl PrincipalFixture {
    pub fn key(&self) -> PrincipalKey {
        PrincipalKey::new(AccountType::new(self.account.as_str()), self.id.as_str())
    }
}

/// Whether a step is expected to be allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Allow,
    Deny,
}

/// One step of a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Login {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
        #[serde(default)]
        ttl_secs: Option<u64>,
    },
    Logout {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
    },
    Kick {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
    },
    /// Check an operation or an inline rule. Without a principal the
    /// request is anonymous.
    Guard {
        #[serde(default)]
        principal: Option<String>,
        #[serde(default = "default_account")]
        account: String,
        #[serde(default)]
        operation: Option<String>,
        #[serde(default)]
        rule: Option<Rule>,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    Ban {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
        service: String,
        /// Absent means permanent.
        #[serde(default)]
        secs: Option<u64>,
    },
    Unban {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
        service: String,
    },
    OpenSafe {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        secs: Option<u64>,
    },
    CloseSafe {
        principal: String,
        #[serde(default = "default_account")]
        account: String,
        #[serde(default)]
        scope: Option<String>,
    },
    Sleep {
        millis: u64,
    },
}

fn default_account() -> String {
    DEFAULT_ACCOUNT_TYPE.to_string()
}

impl Fixture {
    /// Read and validate a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid fixture {}", path.display()))
    }

    /// Parse and validate fixture content.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let fixture: Self = toml::from_str(content).context("failed to parse fixture")?;
        fixture.config.validate()?;
        Ok(fixture)
    }

    /// Build a resolver answering with the fixture's grants.
    pub fn resolver(&self) -> StaticGrantResolver {
        let resolver = StaticGrantResolver::new();
        for principal in &self.principals {
            resolver.insert(
                principal.key(),
                Grants::new(principal.roles.clone(), principal.permissions.clone()),
            );
        }
        resolver
    }

    /// Build a warden with the fixture's configuration, grants and operations.
    pub fn build(&self) -> Result<Warden> {
        let warden = Warden::new(self.config.clone(), self.resolver())
            .context("failed to start warden")?;
        for operation in &self.operations {
            warden.register_operation(operation.clone());
        }
        Ok(warden)
    }
}

/// Read the configured log level from a fixture or plain config file
/// without validating the rest of it.
pub fn peek_log_level(path: &Path) -> Option<LogLevel> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    let level = value
        .get("config")
        .and_then(|config| config.get("log_level"))
        .or_else(|| value.get("log_level"))?;
    level.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
[config]
reaper_enabled = false
concurrent_login = false

[[principals]]
id = "U1"
permissions = ["user.add", "user.update"]

[[principals]]
id = "S1"
account = "staff"
roles = ["admin"]

[[operations]]
name = "add-user"
rule = { all = [{ check = "is_logged_in" }, { check = "has_permission", permission = "user.add" }] }

[[operations]]
name = "open"
rule = "bypass"

[[steps]]
action = "login"
principal = "U1"

[[steps]]
action = "guard"
principal = "U1"
operation = "add-user"
expect = "allow"

[[steps]]
action = "ban"
principal = "U1"
service = "comment"
"#;

    #[test]
    fn test_parse_fixture() {
        let fixture = Fixture::from_toml_str(FIXTURE).unwrap();
        assert!(!fixture.config.concurrent_login);
        assert_eq!(fixture.principals.len(), 2);
        assert_eq!(fixture.principals[0].account, DEFAULT_ACCOUNT_TYPE);
        assert_eq!(fixture.principals[1].key().to_string(), "staff:S1");
        assert_eq!(fixture.operations[1].rule, Rule::bypass());
        assert_eq!(fixture.steps.len(), 3);

        match &fixture.steps[2] {
            Step::Ban { service, secs, .. } => {
                assert_eq!(service, "comment");
                assert_eq!(*secs, None);
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_build_registers_operations() {
        let fixture = Fixture::from_toml_str(FIXTURE).unwrap();
        let warden = fixture.build().unwrap();
        assert_eq!(warden.operations().names(), vec!["add-user", "open"]);
        assert!(!warden.reaper_running());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Fixture::from_toml_str("[config]\ndefault_safe_ttl_secs = 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("default_safe_ttl_secs"));
    }

    #[test]
    fn test_peek_log_level() {
        let dir = tempfile::tempdir().unwrap();

        let nested = dir.path().join("fixture.toml");
        std::fs::write(&nested, "[config]\nlog_level = \"debug\"\n").unwrap();
        assert_eq!(peek_log_level(&nested), Some(LogLevel::Debug));

        let flat = dir.path().join("config.toml");
        std::fs::write(&flat, "log_level = \"warn\"\n").unwrap();
        assert_eq!(peek_log_level(&flat), Some(LogLevel::Warn));

        assert_eq!(peek_log_level(&dir.path().join("missing.toml")), None);
    }
}
