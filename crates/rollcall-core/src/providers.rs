//! Device capabilities and schedule lookup consumed by a check-in.
//!
//! Permission and position are acquired asynchronously by the platform and
//! can fail independently of each other. The decision engine never calls
//! these; the host (see [`crate::checkin`]) acquires both first and then
//! evaluates.

use std::collections::BTreeMap;
use std::future::Future;

use thiserror::Error;

use crate::config::Config;
use crate::error::{Result, RollcallError};
use crate::geo::GeoPoint;
use crate::schedule::ClassSchedule;

/// Why a device capability could not deliver a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The user refused.
    #[error("location access was denied")]
    Denied,

    /// No answer arrived in time.
    #[error("no response after {after_ms} ms")]
    TimedOut {
        /// How long we waited.
        after_ms: u64,
    },

    /// The platform cannot provide the capability right now.
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Source of the location permission decision.
pub trait PermissionProvider: Send + Sync {
    /// Ask for foreground location permission.
    ///
    /// `Ok(false)` means the user declined; `Err` means the platform could
    /// not ask at all.
    fn request_location_permission(
        &self,
    ) -> impl Future<Output = std::result::Result<bool, AcquisitionError>> + Send;
}

/// Source of the device's current position.
pub trait PositionProvider: Send + Sync {
    /// Get a single position fix.
    fn current_position(
        &self,
    ) -> impl Future<Output = std::result::Result<GeoPoint, AcquisitionError>> + Send;
}

/// Lookup of class schedules by class id.
pub trait ScheduleSource: Send + Sync {
    /// Fetch the schedule for `class_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RollcallError::ScheduleNotFound`] for unknown classes.
    fn schedule_for(&self, class_id: &str) -> impl Future<Output = Result<ClassSchedule>> + Send;
}

/// Permission provider with a predetermined answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPermission(pub bool);

impl PermissionProvider for FixedPermission {
    async fn request_location_permission(&self) -> std::result::Result<bool, AcquisitionError> {
        Ok(self.0)
    }
}

/// Position provider with a predetermined result.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPosition(pub std::result::Result<GeoPoint, AcquisitionError>);

impl FixedPosition {
    /// Always report `point`.
    #[must_use]
    pub const fn at(point: GeoPoint) -> Self {
        Self(Ok(point))
    }

    /// Always fail with `error`.
    #[must_use]
    pub const fn failing(error: AcquisitionError) -> Self {
        Self(Err(error))
    }
}

impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> std::result::Result<GeoPoint, AcquisitionError> {
        self.0.clone()
    }
}

/// In-memory schedules, typically built from [`Config`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticScheduleSource {
    schedules: BTreeMap<String, ClassSchedule>,
}

impl StaticScheduleSource {
    /// Build from a list of schedules. Later entries replace earlier ones
    /// with the same class id.
    #[must_use]
    pub fn new(schedules: impl IntoIterator<Item = ClassSchedule>) -> Self {
        Self {
            schedules: schedules
                .into_iter()
                .map(|s| (s.class_id().to_string(), s))
                .collect(),
        }
    }

    /// Build from the schedules in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any entry is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.class_schedules()?))
    }

    /// Look up a schedule.
    #[must_use]
    pub fn get(&self, class_id: &str) -> Option<&ClassSchedule> {
        self.schedules.get(class_id)
    }

    /// All schedules, ordered by class id.
    pub fn iter(&self) -> impl Iterator<Item = &ClassSchedule> {
        self.schedules.values()
    }

    /// Number of schedules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Returns `true` if there are no schedules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl ScheduleSource for StaticScheduleSource {
    async fn schedule_for(&self, class_id: &str) -> Result<ClassSchedule> {
        self.get(class_id)
            .cloned()
            .ok_or_else(|| RollcallError::ScheduleNotFound(class_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(id: &str, start: &str) -> ClassSchedule {
        ClassSchedule::parse(id, start, "23:00", GeoPoint::new(0.0, 0.0).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_fixed_permission() {
        assert_eq!(FixedPermission(true).request_location_permission().await, Ok(true));
        assert_eq!(FixedPermission(false).request_location_permission().await, Ok(false));
    }

    #[tokio::test]
    async fn test_fixed_position() {
        let point = GeoPoint::new(1.0, 2.0).unwrap();
        assert_eq!(FixedPosition::at(point).current_position().await, Ok(point));
        assert_eq!(
            FixedPosition::failing(AcquisitionError::TimedOut { after_ms: 5 })
                .current_position()
                .await,
            Err(AcquisitionError::TimedOut { after_ms: 5 })
        );
    }

    #[tokio::test]
    async fn test_static_source_lookup() {
        let source = StaticScheduleSource::new([schedule("B200", "08:00"), schedule("A100", "09:00")]);
        assert_eq!(source.len(), 2);

        let found = source.schedule_for("A100").await.unwrap();
        assert_eq!(found.class_id(), "A100");

        let err = source.schedule_for("Z999").await.unwrap_err();
        assert!(matches!(err, RollcallError::ScheduleNotFound(ref id) if id == "Z999"));
    }

    #[test]
    fn test_static_source_is_ordered_and_deduplicated() {
        let source = StaticScheduleSource::new([
            schedule("B200", "08:00"),
            schedule("A100", "09:00"),
            schedule("B200", "10:00"),
        ]);
        let ids: Vec<&str> = source.iter().map(ClassSchedule::class_id).collect();
        assert_eq!(ids, ["A100", "B200"]);
        assert_eq!(source.get("B200").unwrap().start().to_string(), "10:00:00");
    }

    #[test]
    fn test_from_default_config() {
        let source = StaticScheduleSource::from_config(&Config::default()).unwrap();
        assert!(source.get("CS101").is_some());
        assert!(!source.is_empty());
    }
}
