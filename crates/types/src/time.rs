//! Simulation time helpers.
//!
//! All timestamps are UTC instants. Behavior parameters are expressed in
//! (fractional) days, so conversions between `f64` days and `Duration`
//! live here in one place.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Instant on the simulation timeline.
pub type Timestamp = DateTime<Utc>;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert fractional days into a `Duration`, rounded to whole seconds.
///
/// Negative and non-finite inputs map to zero.
pub fn days(value: f64) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::zero();
    }
    Duration::seconds((value * SECONDS_PER_DAY).round() as i64)
}

/// Convert a `Duration` into fractional days.
pub fn as_days(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / SECONDS_PER_DAY
}

/// Midnight UTC of a calendar date.
pub fn start_of_day(date: NaiveDate) -> Timestamp {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Calendar quarter (1-4) of a timestamp.
pub fn quarter_of(ts: Timestamp) -> u32 {
    use chrono::Datelike;
    (ts.month() - 1) / 3 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_round_trip() {
        let d = days(1.5);
        assert_eq!(d.num_seconds(), 129_600);
        assert!((as_days(d) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_days_rejects_negative() {
        assert_eq!(days(-2.0), Duration::zero());
        assert_eq!(days(f64::NAN), Duration::zero());
    }

    #[test]
    fn test_quarter_of() {
        let date = NaiveDate::from_ymd_opt(2023, 8, 14).unwrap();
        assert_eq!(quarter_of(start_of_day(date)), 3);
    }
}
