//! Time helpers

use chrono::{Datelike, Utc};

/// Milliseconds since the Unix epoch
///
/// Used as the id of newly created records.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current calendar year (UTC)
pub fn current_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
        // 2020-01-01T00:00:00Z
        assert!(a > 1_577_836_800_000);
    }

    #[test]
    fn test_current_year_is_plausible() {
        let year = current_year();
        assert!(year >= 2024);
    }
}
