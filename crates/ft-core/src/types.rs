//! Shared value types.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// The system's canonical minimum time increment, in minutes.
///
/// Every time-valued field (start/finish times, break bounds, allowance
/// minutes, pay-rate durations) must be a multiple of this. Violating
/// inputs are rejected naming the field, never silently rounded.
pub const QUARTER_HOUR_MIN: u32 = 15;

/// Whether a duration in minutes sits on a quarter-hour boundary.
pub fn is_quarter_hour(minutes: u32) -> bool {
    minutes % QUARTER_HOUR_MIN == 0
}

/// Whether a timestamp sits on a quarter-hour boundary (seconds ignored
/// only if zero).
pub fn on_quarter_hour(ts: DateTime<Utc>) -> bool {
    ts.second() == 0 && ts.nanosecond() == 0 && ts.minute() % QUARTER_HOUR_MIN == 0
}

/// Capture-time geolocation attached to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in metres.
    pub accuracy_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quarter_hour_minutes() {
        assert!(is_quarter_hour(0));
        assert!(is_quarter_hour(45));
        assert!(!is_quarter_hour(70));
    }

    #[test]
    fn quarter_hour_timestamps() {
        let aligned = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        let off = Utc.with_ymd_and_hms(2025, 6, 1, 8, 40, 0).unwrap();
        let seconds = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 12).unwrap();
        assert!(on_quarter_hour(aligned));
        assert!(!on_quarter_hour(off));
        assert!(!on_quarter_hour(seconds));
    }
}
