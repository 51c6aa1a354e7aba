//! Utility types and helpers.
//!
//! This module provides configuration loading, log levels and deadline
//! arithmetic used throughout Warden.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{TokenStyle, WardenConfig};
pub use logging::LogLevel;
pub use time::{deadline_after, elapsed_between};
