//! Attendance decision engine.
//!
//! Combines three independent checks into one terminal status. The checks
//! run in a fixed order and the first failing one decides the outcome:
//!
//! 1. Location permission was granted.
//! 2. A position was observed.
//! 3. The attempt falls inside the class's time window (closed interval).
//! 4. The observed position is within the geofence radius.
//!
//! Evaluation is pure: no I/O, no mutation, the same inputs always give the
//! same status. Persisting a [`AttendanceStatus::Marked`] result is up to the
//! caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::attempt::AttendanceAttempt;
use crate::geo::Geofence;
use crate::schedule::{ClassSchedule, TimeWindow};

/// Geofence radius used when none is configured, in meters.
pub const DEFAULT_GEOFENCE_RADIUS_METERS: f64 = 100.0;

/// Outcome of a check-in attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// No attempt has been evaluated yet.
    #[default]
    NotAttempted,
    /// Location permission was not granted.
    PermissionDenied,
    /// The attempt was made before the class started or after it ended.
    OutsideTimeWindow,
    /// The observed position is farther than the geofence radius.
    OutsideGeofence,
    /// Attendance is valid.
    Marked,
    /// Permission was granted but no usable position was supplied.
    EvaluationError,
}

impl AttendanceStatus {
    /// Machine-readable code, identical to the serialized form.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotAttempted => "not_attempted",
            Self::PermissionDenied => "permission_denied",
            Self::OutsideTimeWindow => "outside_time_window",
            Self::OutsideGeofence => "outside_geofence",
            Self::Marked => "marked",
            Self::EvaluationError => "evaluation_error",
        }
    }

    /// Returns `true` for a successful mark.
    #[inline]
    #[must_use]
    pub const fn is_marked(self) -> bool {
        matches!(self, Self::Marked)
    }

    /// Returns `true` for expected refusals that are not faults.
    #[inline]
    #[must_use]
    pub const fn is_policy_outcome(self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::OutsideTimeWindow | Self::OutsideGeofence
        )
    }

    /// Returns `true` if the attempt could not be evaluated.
    #[inline]
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::EvaluationError)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A geofence radius that is not a positive, finite number of meters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Invalid geofence radius {0}. Expected a finite number of meters greater than zero.")]
pub struct InvalidRadius(pub f64);

/// Returns `true` if `radius` can be used as a geofence radius.
#[must_use]
pub fn is_valid_radius(radius: f64) -> bool {
    radius.is_finite() && radius > 0.0
}

/// Status of an evaluation together with what was measured on the way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    /// Final status.
    pub status: AttendanceStatus,
    /// The window the attempt was compared against, once computed.
    pub window: Option<TimeWindow>,
    /// Distance to the class location, once computed.
    pub distance_meters: Option<f64>,
    /// Radius the distance was compared against.
    pub geofence_radius_meters: f64,
}

/// Decide the status of `attempt` against `schedule`.
///
/// A position counts as inside the geofence when its distance is at most
/// `geofence_radius_meters`. Pass [`DEFAULT_GEOFENCE_RADIUS_METERS`] for the
/// standard 100 m fence.
#[must_use]
pub fn evaluate(
    schedule: &ClassSchedule,
    attempt: &AttendanceAttempt,
    geofence_radius_meters: f64,
) -> AttendanceStatus {
    decide(schedule, attempt, geofence_radius_meters).status
}

fn decide(
    schedule: &ClassSchedule,
    attempt: &AttendanceAttempt,
    geofence_radius_meters: f64,
) -> Assessment {
    let mut assessment = Assessment {
        status: AttendanceStatus::NotAttempted,
        window: None,
        distance_meters: None,
        geofence_radius_meters,
    };

    if !attempt.permission_granted {
        assessment.status = AttendanceStatus::PermissionDenied;
        return assessment;
    }

    let Some(position) = attempt.observed_position else {
        assessment.status = AttendanceStatus::EvaluationError;
        return assessment;
    };

    let window = schedule.window_on(attempt.timestamp.date());
    assessment.window = Some(window);
    if !window.contains(attempt.timestamp) {
        assessment.status = AttendanceStatus::OutsideTimeWindow;
        return assessment;
    }

    let fence = Geofence::new(schedule.location(), geofence_radius_meters);
    let distance = fence.distance_to(position);
    assessment.distance_meters = Some(distance);
    assessment.status = geofence_status(&fence, distance);
    assessment
}

/// Status for a position `distance` meters from the fence center.
///
/// Validated points always give a finite distance; a non-finite one means
/// the distance computation itself failed and is never treated as a refusal.
fn geofence_status(fence: &Geofence, distance: f64) -> AttendanceStatus {
    if !distance.is_finite() {
        AttendanceStatus::EvaluationError
    } else if fence.admits(distance) {
        AttendanceStatus::Marked
    } else {
        AttendanceStatus::OutsideGeofence
    }
}

/// Deployment-level decision settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendancePolicy {
    geofence_radius_meters: f64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            geofence_radius_meters: DEFAULT_GEOFENCE_RADIUS_METERS,
        }
    }
}

impl AttendancePolicy {
    /// Create a policy with a custom geofence radius.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRadius`] unless the radius is finite and positive.
    pub fn new(geofence_radius_meters: f64) -> Result<Self, InvalidRadius> {
        if !is_valid_radius(geofence_radius_meters) {
            return Err(InvalidRadius(geofence_radius_meters));
        }
        Ok(Self {
            geofence_radius_meters,
        })
    }

    /// Configured geofence radius, in meters.
    #[must_use]
    pub const fn geofence_radius_meters(&self) -> f64 {
        self.geofence_radius_meters
    }

    /// Decide the status of `attempt`.
    #[must_use]
    pub fn evaluate(&self, schedule: &ClassSchedule, attempt: &AttendanceAttempt) -> AttendanceStatus {
        self.assess(schedule, attempt).status
    }

    /// Decide the status of `attempt` and keep the intermediate measurements.
    #[must_use]
    pub fn assess(&self, schedule: &ClassSchedule, attempt: &AttendanceAttempt) -> Assessment {
        let assessment = decide(schedule, attempt, self.geofence_radius_meters);
        debug!(
            attempt_id = %attempt.id,
            class_id = schedule.class_id(),
            status = %assessment.status,
            distance_m = ?assessment.distance_meters,
            radius_m = self.geofence_radius_meters,
            "Attendance attempt evaluated"
        );
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{distance_meters, GeoPoint, EARTH_RADIUS_KM};
    use chrono::{NaiveDate, NaiveDateTime};

    fn venue() -> GeoPoint {
        GeoPoint::new(37.7749, -122.4194).unwrap()
    }

    fn schedule() -> ClassSchedule {
        ClassSchedule::parse("CS101", "09:00", "10:30", venue()).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    /// A point `meters` due north of `origin`, measured along the meridian.
    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        let delta = (meters / (EARTH_RADIUS_KM * 1000.0)).to_degrees();
        GeoPoint::new(origin.latitude() + delta, origin.longitude()).unwrap()
    }

    fn granted(ts: NaiveDateTime, position: GeoPoint) -> AttendanceAttempt {
        AttendanceAttempt::new(ts, Some(position), true)
    }

    #[test]
    fn test_permission_denied_wins_over_everything() {
        let far = GeoPoint::new(0.0, 0.0).unwrap();
        for (ts, pos) in [
            (at(9, 30, 0), Some(venue())),
            (at(3, 0, 0), Some(far)),
            (at(9, 30, 0), None),
        ] {
            let attempt = AttendanceAttempt::new(ts, pos, false);
            assert_eq!(
                evaluate(&schedule(), &attempt, DEFAULT_GEOFENCE_RADIUS_METERS),
                AttendanceStatus::PermissionDenied
            );
        }
    }

    #[test]
    fn test_missing_position_is_evaluation_error() {
        let attempt = AttendanceAttempt::new(at(9, 30, 0), None, true);
        assert_eq!(
            evaluate(&schedule(), &attempt, 100.0),
            AttendanceStatus::EvaluationError
        );

        // Position is checked before time.
        let attempt = AttendanceAttempt::new(at(23, 0, 0), None, true);
        assert_eq!(
            evaluate(&schedule(), &attempt, 100.0),
            AttendanceStatus::EvaluationError
        );
    }

    #[test]
    fn test_time_window_boundaries() {
        let s = schedule();
        let cases = [
            (at(8, 59, 59), AttendanceStatus::OutsideTimeWindow),
            (at(9, 0, 0), AttendanceStatus::Marked),
            (at(10, 30, 0), AttendanceStatus::Marked),
            (at(10, 30, 1), AttendanceStatus::OutsideTimeWindow),
        ];
        for (ts, expected) in cases {
            assert_eq!(evaluate(&s, &granted(ts, venue()), 100.0), expected, "at {ts}");
        }
    }

    #[test]
    fn test_time_is_checked_before_distance() {
        let far = GeoPoint::new(0.0, 0.0).unwrap();
        assert_eq!(
            evaluate(&schedule(), &granted(at(8, 0, 0), far), 100.0),
            AttendanceStatus::OutsideTimeWindow
        );
    }

    #[test]
    fn test_just_outside_geofence() {
        let position = north_of(venue(), 100.0001);
        assert!(distance_meters(position, venue()) > 100.0);
        assert_eq!(
            evaluate(&schedule(), &granted(at(9, 30, 0), position), 100.0),
            AttendanceStatus::OutsideGeofence
        );
    }

    #[test]
    fn test_just_inside_geofence() {
        let position = north_of(venue(), 99.9);
        assert_eq!(
            evaluate(&schedule(), &granted(at(9, 30, 0), position), 100.0),
            AttendanceStatus::Marked
        );
    }

    #[test]
    fn test_at_venue_is_marked() {
        assert_eq!(
            evaluate(&schedule(), &granted(at(9, 30, 0), venue()), 100.0),
            AttendanceStatus::Marked
        );
    }

    #[test]
    fn test_radius_is_configurable() {
        let position = north_of(venue(), 250.0);
        let attempt = granted(at(9, 30, 0), position);

        assert_eq!(
            AttendancePolicy::default().evaluate(&schedule(), &attempt),
            AttendanceStatus::OutsideGeofence
        );
        assert_eq!(
            AttendancePolicy::new(300.0).unwrap().evaluate(&schedule(), &attempt),
            AttendanceStatus::Marked
        );
    }

    #[test]
    fn test_nan_radius_never_marks() {
        assert_eq!(
            evaluate(&schedule(), &granted(at(9, 30, 0), venue()), f64::NAN),
            AttendanceStatus::OutsideGeofence
        );
    }

    #[test]
    fn test_non_finite_distance_is_evaluation_error() {
        let fence = Geofence::new(venue(), 100.0);
        assert_eq!(
            geofence_status(&fence, f64::NAN),
            AttendanceStatus::EvaluationError
        );
        assert_eq!(
            geofence_status(&fence, f64::INFINITY),
            AttendanceStatus::EvaluationError
        );
        assert_eq!(geofence_status(&fence, 99.0), AttendanceStatus::Marked);
        assert_eq!(
            geofence_status(&fence, 101.0),
            AttendanceStatus::OutsideGeofence
        );
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let s = schedule();
        let attempt = granted(at(10, 0, 0), north_of(venue(), 42.0));
        let first = evaluate(&s, &attempt, 100.0);
        let second = evaluate(&s, &attempt, 100.0);
        assert_eq!(first, second);
        assert_eq!(s, schedule());
    }

    #[test]
    fn test_assess_reports_diagnostics() {
        let policy = AttendancePolicy::default();
        let position = north_of(venue(), 50.0);
        let assessment = policy.assess(&schedule(), &granted(at(9, 15, 0), position));

        assert_eq!(assessment.status, AttendanceStatus::Marked);
        assert_eq!(assessment.geofence_radius_meters, 100.0);
        let distance = assessment.distance_meters.unwrap();
        assert!((distance - 50.0).abs() < 1e-6, "got {distance}");
        assert_eq!(assessment.window.unwrap().start, at(9, 0, 0));
    }

    #[test]
    fn test_assess_stops_at_first_failing_check() {
        let policy = AttendancePolicy::default();

        let denied = policy.assess(&schedule(), &AttendanceAttempt::denied(at(9, 15, 0)));
        assert!(denied.window.is_none());
        assert!(denied.distance_meters.is_none());

        let late = policy.assess(&schedule(), &granted(at(11, 0, 0), venue()));
        assert!(late.window.is_some());
        assert!(late.distance_meters.is_none());
    }

    #[test]
    fn test_policy_rejects_invalid_radius() {
        assert_eq!(AttendancePolicy::new(0.0), Err(InvalidRadius(0.0)));
        assert_eq!(AttendancePolicy::new(-5.0), Err(InvalidRadius(-5.0)));
        assert!(AttendancePolicy::new(f64::NAN).is_err());
        assert!(AttendancePolicy::new(f64::INFINITY).is_err());
        assert!(AttendancePolicy::new(0.5).is_ok());
    }

    #[test]
    fn test_status_classification() {
        assert!(AttendanceStatus::Marked.is_marked());
        assert!(AttendanceStatus::OutsideGeofence.is_policy_outcome());
        assert!(AttendanceStatus::PermissionDenied.is_policy_outcome());
        assert!(!AttendanceStatus::EvaluationError.is_policy_outcome());
        assert!(AttendanceStatus::EvaluationError.is_error());
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::NotAttempted);
    }

    #[test]
    fn test_status_serialization_matches_code() {
        for status in [
            AttendanceStatus::NotAttempted,
            AttendanceStatus::PermissionDenied,
            AttendanceStatus::OutsideTimeWindow,
            AttendanceStatus::OutsideGeofence,
            AttendanceStatus::Marked,
            AttendanceStatus::EvaluationError,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.code()));
        }
    }
}
