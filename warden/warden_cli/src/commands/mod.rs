//! Subcommand implementations.

pub mod check_config;
pub mod evaluate;
pub mod scenario;
