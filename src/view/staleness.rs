//! Staleness classification.
//!
//! A professor is stale when nobody has logged contact within the rolling
//! window. All instants are UTC.

use chrono::{DateTime, Duration, Utc};

use crate::models::Professor;

/// Length of the rolling contact window in days.
pub const STALE_WINDOW_DAYS: i64 = 30;

/// Returns true if `last_contacted` is unset or strictly older than the window at `now`.
///
/// Exactly 30 days is not stale. A future-dated contact is never stale.
pub fn is_stale(last_contacted: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_contacted {
        None => true,
        Some(at) => now.signed_duration_since(at) > Duration::days(STALE_WINDOW_DAYS),
    }
}

impl Professor {
    /// Whether this professor is stale at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        is_stale(self.last_contacted, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_never_contacted_is_stale() {
        assert!(is_stale(None, now()));
    }

    #[test]
    fn test_boundary_is_strict() {
        let exactly = now() - Duration::days(30);
        assert!(!is_stale(Some(exactly), now()));

        let just_over = exactly - Duration::seconds(1);
        assert!(is_stale(Some(just_over), now()));
    }

    #[test]
    fn test_recent_contact_is_fresh() {
        assert!(!is_stale(Some(now() - Duration::days(29)), now()));
        assert!(is_stale(Some(now() - Duration::days(31)), now()));
    }

    #[test]
    fn test_future_contact_is_fresh() {
        assert!(!is_stale(Some(now() + Duration::days(400)), now()));
    }
}
