//! The `evaluate` command.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use warden_core::id::DEFAULT_ACCOUNT_TYPE;
use warden_core::types::Principal;
use warden_policy::{RequestContext, Rule};

use crate::fixture::Fixture;

/// Arguments for the evaluate command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the fixture file
    #[clap(long)]
    pub fixture: PathBuf,

    /// Principal to log in before evaluating; anonymous when absent
    #[clap(long)]
    pub principal: Option<String>,

    /// Account type of the principal
    #[clap(long, default_value = DEFAULT_ACCOUNT_TYPE)]
    pub account: String,

    /// Rule to evaluate, as JSON
    #[clap(long, required_unless_present = "operation", conflicts_with = "operation")]
    pub rule: Option<String>,

    /// Name of an operation declared in the fixture
    #[clap(long)]
    pub operation: Option<String>,
}

/// Log the principal in, evaluate the rule and print the decision.
pub fn execute(args: &EvaluateArgs) -> Result<()> {
    let fixture = Fixture::load(&args.fixture)?;
    let warden = fixture.build()?;

    let rule: Rule = match (&args.rule, &args.operation) {
        (Some(json), _) => serde_json::from_str(json).context("failed to parse rule")?,
        (None, Some(name)) => warden
            .operations()
            .rule_for(name)
            .ok_or_else(|| anyhow!("unknown operation '{}'", name))?,
        (None, None) => return Err(anyhow!("either --rule or --operation is required")),
    };

    debug!(rule = %rule, principal = ?args.principal, account = %args.account, "Evaluating rule");

    let mut ctx = RequestContext::anonymous();
    if let Some(id) = &args.principal {
        let principal = Principal::new(args.account.as_str(), id.as_str());
        let token = warden
            .login(principal)
            .with_context(|| format!("failed to log in {}:{}", args.account, id))?;
        ctx = ctx.with_account_token(args.account.as_str(), token);
    }

    let result = warden
        .evaluate(&rule, &ctx)
        .context("rule could not be evaluated")?;

    println!("Rule: {}", rule);
    println!("{}", result);
    if let Some(err) = result.to_error() {
        println!("Reason: {}", err);
    }

    warden.shutdown();
    Ok(())
}
