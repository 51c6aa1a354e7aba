//! Time-bounded per-principal ledgers.
//!
//! Both ledgers key their records by principal and a caller-chosen name (a
//! step-up scope or a service), and both expire records lazily.

mod ban;
mod safe_zone;

pub use ban::{BanDuration, BanLedger, BanRemaining};
pub use safe_zone::SafeZoneTracker;
