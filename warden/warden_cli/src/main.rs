//! Warden command-line interface.
//!
//! Demo front end for the authorization core: validates configuration files
//! and drives login, guard, ban and safe-zone flows against TOML fixtures.

mod commands;
mod fixture;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use commands::check_config::CheckConfigArgs;
use commands::evaluate::EvaluateArgs;
use commands::scenario::ScenarioArgs;
use warden_core::utils::LogLevel;

/// Warden Command Line Interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log level; overrides RUST_LOG and the configured level
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    #[clap(name = "check-config")]
    CheckConfig(CheckConfigArgs),

    /// Evaluate one rule for one principal
    Evaluate(EvaluateArgs),

    /// Replay the steps of a fixture
    Scenario(ScenarioArgs),
}

impl Commands {
    fn source(&self) -> &Path {
        match self {
            Self::CheckConfig(args) => &args.config,
            Self::Evaluate(args) => &args.fixture,
            Self::Scenario(args) => &args.fixture,
        }
    }
}

fn init_logging(flag: Option<LogLevel>, configured: Option<LogLevel>) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(configured.unwrap_or_default().as_directive())
        }),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        cli.log_level,
        fixture::peek_log_level(cli.command.source()),
    );

    match &cli.command {
        Commands::CheckConfig(args) => commands::check_config::execute(args),
        Commands::Evaluate(args) => commands::evaluate::execute(args),
        Commands::Scenario(args) => commands::scenario::execute(args),
    }
}
