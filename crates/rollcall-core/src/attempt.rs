//! Check-in attempts.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// Everything known about one user-initiated check-in at the moment it is
/// evaluated.
///
/// An attempt is built once per action and never mutated; a retry is a new
/// attempt with a new [`id`](Self::id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceAttempt {
    /// Correlation id for logs.
    pub id: Uuid,

    /// Local wall-clock instant of evaluation, in the venue's timezone.
    pub timestamp: NaiveDateTime,

    /// Device position, if acquisition succeeded.
    pub observed_position: Option<GeoPoint>,

    /// Whether location permission was granted for this attempt.
    pub permission_granted: bool,
}

impl AttendanceAttempt {
    /// Build an attempt from a local timestamp.
    #[must_use]
    pub fn new(
        timestamp: NaiveDateTime,
        observed_position: Option<GeoPoint>,
        permission_granted: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            observed_position,
            permission_granted,
        }
    }

    /// Build an attempt from a UTC instant, converting it to wall-clock time
    /// in `timezone` first.
    #[must_use]
    pub fn from_utc(
        instant: DateTime<Utc>,
        timezone: Tz,
        observed_position: Option<GeoPoint>,
        permission_granted: bool,
    ) -> Self {
        Self::new(
            instant.with_timezone(&timezone).naive_local(),
            observed_position,
            permission_granted,
        )
    }

    /// An attempt where permission was refused. No position is recorded.
    #[must_use]
    pub fn denied(timestamp: NaiveDateTime) -> Self {
        Self::new(timestamp, None, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_from_utc_converts_to_local_time() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 15, 17, 30, 0).unwrap();
        let attempt =
            AttendanceAttempt::from_utc(instant, chrono_tz::America::Los_Angeles, None, true);

        let expected = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(attempt.timestamp, expected);
    }

    #[test]
    fn test_from_utc_can_change_calendar_date() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 15, 23, 0, 0).unwrap();
        let attempt = AttendanceAttempt::from_utc(instant, chrono_tz::Asia::Tokyo, None, true);
        assert_eq!(
            attempt.timestamp.date(),
            NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
        );
    }

    #[test]
    fn test_each_attempt_gets_a_fresh_id() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let a = AttendanceAttempt::new(ts, None, true);
        let b = AttendanceAttempt::new(ts, None, true);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_denied_has_no_position() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let attempt = AttendanceAttempt::denied(ts);
        assert!(!attempt.permission_granted);
        assert!(attempt.observed_position.is_none());
    }
}
