//! The `check-config` command.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

use warden_core::utils::WardenConfig;

/// Arguments for the check-config command
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Path to the configuration file
    #[clap(long)]
    pub config: PathBuf,
}

/// Validate a configuration file and print the effective settings.
pub fn execute(args: &CheckConfigArgs) -> Result<()> {
    // A missing file would silently fall back to defaults
    if !args.config.exists() {
        bail!("configuration file not found: {}", args.config.display());
    }

    let config = WardenConfig::load(&args.config)
        .with_context(|| format!("invalid configuration {}", args.config.display()))?;
    let rendered =
        toml::to_string_pretty(&config).context("failed to render configuration")?;

    println!("Configuration OK: {}", args.config.display());
    print!("{}", rendered);
    Ok(())
}
