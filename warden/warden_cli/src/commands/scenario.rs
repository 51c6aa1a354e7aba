//! The `scenario` command.
//!
//! Replays the fixture's steps against a fresh warden and prints one line
//! per step. Guard steps may carry an expectation; the command fails if any
//! decision differs from it.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use warden_core::error::AuthError;
use warden_core::id::{AccountType, PrincipalKey, Token, GLOBAL_SCOPE};
use warden_core::types::Principal;
use warden_policy::{PolicyError, RequestContext, Warden};
use warden_store::BanDuration;

use crate::fixture::{Expectation, Fixture, Step};

/// Arguments for the scenario command
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Path to the fixture file
    #[clap(long)]
    pub fixture: PathBuf,
}

/// Run every step of the fixture.
pub fn execute(args: &ScenarioArgs) -> Result<()> {
    let fixture = Fixture::load(&args.fixture)?;
    if fixture.steps.is_empty() {
        bail!("fixture {} has no steps", args.fixture.display());
    }

    let warden = fixture.build()?;
    info!(fixture = %args.fixture.display(), steps = fixture.steps.len(), "Running scenario");

    let mut runner = Runner::new(&warden);
    for (index, step) in fixture.steps.iter().enumerate() {
        let line = runner
            .run(step)
            .with_context(|| format!("step {} failed", index + 1))?;
        println!("[{}] {}", index + 1, line);
    }
    let mismatches = runner.mismatches;

    warden.shutdown();

    if mismatches > 0 {
        bail!("{} step(s) did not match expectations", mismatches);
    }
    println!("Scenario complete: {} steps", fixture.steps.len());
    Ok(())
}

struct Runner<'a> {
    warden: &'a Warden,
    tokens: HashMap<PrincipalKey, Token>,
    mismatches: usize,
}

impl<'a> Runner<'a> {
    fn new(warden: &'a Warden) -> Self {
        Self {
            warden,
            tokens: HashMap::new(),
            mismatches: 0,
        }
    }

    fn run(&mut self, step: &Step) -> Result<String> {
        debug!(?step, "Running step");
        match step {
            Step::Login {
                principal,
                account,
                ttl_secs,
            } => {
                let principal = Principal::new(account.as_str(), principal.as_str());
                let key = principal.key().clone();
                let ttl = match ttl_secs {
                    Some(secs) => Some(Duration::from_secs(*secs)),
                    None => self.warden.config().session_timeout(),
                };
                let token = self.warden.login_with_ttl(principal, ttl)?;
                self.tokens.insert(key.clone(), token);
                Ok(format!("login {}", key))
            }
            Step::Logout { principal, account } => {
                let key = key_for(account, principal);
                let ended = match self.tokens.remove(&key) {
                    Some(token) => self.warden.logout(&token),
                    None => false,
                };
                Ok(format!(
                    "logout {} -> {}",
                    key,
                    if ended { "ended" } else { "no session" }
                ))
            }
            Step::Kick { principal, account } => {
                let key = key_for(account, principal);
                let ended = self.warden.kick(&key);
                self.tokens.remove(&key);
                Ok(format!("kick {} -> {} session(s) ended", key, ended))
            }
            Step::Guard {
                principal,
                account,
                operation,
                rule,
                expect,
            } => {
                let mut ctx = RequestContext::anonymous();
                let subject = match principal {
                    Some(id) => {
                        let key = key_for(account, id);
                        if let Some(token) = self.tokens.get(&key) {
                            ctx = ctx.with_account_token(account.as_str(), token.clone());
                        }
                        key.to_string()
                    }
                    None => "anonymous".to_string(),
                };

                let (target, decision) = match (operation, rule) {
                    (Some(name), _) => (name.clone(), self.guard_operation(name, &ctx)?),
                    (None, Some(rule)) => (rule.to_string(), self.warden.guard(rule, &ctx)),
                    (None, None) => bail!("guard step needs an operation or a rule"),
                };

                let (outcome, allowed) = match &decision {
                    Ok(()) => ("ALLOW".to_string(), true),
                    Err(err) if err.is_denial() => (format!("DENY ({})", err), false),
                    Err(err) => bail!("guard on {} could not decide: {}", target, err),
                };

                let mut line = format!("guard {} as {} -> {}", target, subject, outcome);
                if let Some(expect) = expect {
                    let expected_allow = *expect == Expectation::Allow;
                    if expected_allow != allowed {
                        self.mismatches += 1;
                        line.push_str(if expected_allow {
                            " [expected allow]"
                        } else {
                            " [expected deny]"
                        });
                    }
                }
                Ok(line)
            }
            Step::Ban {
                principal,
                account,
                service,
                secs,
            } => {
                let key = key_for(account, principal);
                let duration = match secs {
                    Some(secs) => BanDuration::For(Duration::from_secs(*secs)),
                    None => BanDuration::Permanent,
                };
                self.warden.ban(&key, service, duration);
                let span = match secs {
                    Some(secs) => format!("{}s", secs),
                    None => "permanent".to_string(),
                };
                Ok(format!("ban {} from {} ({})", key, service, span))
            }
            Step::Unban {
                principal,
                account,
                service,
            } => {
                let key = key_for(account, principal);
                let lifted = self.warden.unban(&key, service);
                Ok(format!(
                    "unban {} from {} -> {}",
                    key,
                    service,
                    if lifted { "lifted" } else { "not banned" }
                ))
            }
            Step::OpenSafe {
                principal,
                account,
                scope,
                secs,
            } => {
                let key = key_for(account, principal);
                let scope = scope.as_deref().unwrap_or(GLOBAL_SCOPE);
                let expires_at = match secs {
                    Some(secs) => self
                        .warden
                        .open_safe_for(&key, scope, Duration::from_secs(*secs)),
                    None => self.warden.open_safe(&key, scope),
                };
                Ok(format!(
                    "open safe {} for {} until {}",
                    scope,
                    key,
                    expires_at.to_rfc3339()
                ))
            }
            Step::CloseSafe {
                principal,
                account,
                scope,
            } => {
                let key = key_for(account, principal);
                let scope = scope.as_deref().unwrap_or(GLOBAL_SCOPE);
                let closed = self.warden.close_safe(&key, scope);
                Ok(format!(
                    "close safe {} for {} -> {}",
                    scope,
                    key,
                    if closed { "closed" } else { "not open" }
                ))
            }
            Step::Sleep { millis } => {
                thread::sleep(Duration::from_millis(*millis));
                Ok(format!("sleep {}ms", millis))
            }
        }
    }

    fn guard_operation(
        &self,
        name: &str,
        ctx: &RequestContext,
    ) -> Result<std::result::Result<(), AuthError>> {
        match self.warden.guard_operation(name, ctx) {
            Ok(()) => Ok(Ok(())),
            Err(PolicyError::Auth(err)) => Ok(Err(err)),
            Err(err) => Err(err.into()),
        }
    }
}

fn key_for(account: &str, id: &str) -> PrincipalKey {
    PrincipalKey::new(AccountType::new(account), id)
}
