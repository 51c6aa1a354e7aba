//! Deadline arithmetic.
//!
//! TTLs are `std::time::Duration`, timestamps are `chrono::DateTime<Utc>`.
//! These helpers convert between the two without panicking on overflow.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Compute `now + ttl`, saturating at the largest representable timestamp.
pub fn deadline_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Compute `to - from`, clamped at zero.
pub fn elapsed_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_saturates() {
        let now = Utc::now();
        assert_eq!(deadline_after(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(
            deadline_after(now, Duration::from_secs(1)),
            now + chrono::Duration::seconds(1)
        );
    }

    #[test]
    fn test_elapsed_clamps_at_zero() {
        let now = Utc::now();
        let later = now + chrono::Duration::seconds(5);
        assert_eq!(elapsed_between(now, later), Duration::from_secs(5));
        assert_eq!(elapsed_between(later, now), Duration::ZERO);
    }
}
