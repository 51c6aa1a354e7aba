//! # Warden Store
//!
//! Concurrent in-memory state for the Warden authorization core.
//!
//! This crate provides:
//!
//! - [`SessionStore`]: the session storage contract, with the sharded
//!   [`InMemorySessionStore`] implementation.
//! - [`SafeZoneTracker`]: time-bounded step-up records per principal and scope.
//! - [`BanLedger`]: per-service bans, timed or permanent.
//! - [`Reaper`]: a background thread that purges dead records.
//! - [`TokenGenerator`]: unguessable session tokens.
//!
//! All stores are safe to share between threads and evaluate expiry lazily
//! against the current time on every read.

pub mod ledger;
pub mod reaper;
pub mod session;
pub mod token;

pub use ledger::{BanDuration, BanLedger, BanRemaining, SafeZoneTracker};
pub use reaper::Reaper;
pub use session::{InMemorySessionStore, SessionPolicy, SessionStore};
pub use token::TokenGenerator;
