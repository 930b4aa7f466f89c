//! # rollcall-core
//!
//! Core logic for the rollcall attendance verification system.
//!
//! Decides whether a check-in attempt marks attendance by combining three
//! constraints: location permission, a daily time window, and a circular
//! geofence around the class location.
//!
//! ## Architecture
//!
//! - [`geo`] - Geographic points and haversine distance
//! - [`schedule`] - Class schedules and daily time windows
//! - [`attempt`] - One immutable check-in attempt
//! - [`decision`] - The decision engine and attendance statuses
//! - [`providers`] - Permission, position and schedule capabilities
//! - [`checkin`] - Sequencing acquisition and evaluation for one user action
//! - [`config`] - Configuration loading, saving and validation
//! - [`error`] - Unified error types for the crate
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rollcall_core::{evaluate, AttendanceAttempt, AttendanceStatus, ClassSchedule, GeoPoint};
//!
//! let venue = GeoPoint::new(37.7749, -122.4194).unwrap();
//! let schedule = ClassSchedule::parse("CS101", "09:00", "10:30", venue).unwrap();
//! let now = NaiveDate::from_ymd_opt(2025, 3, 14)
//!     .unwrap()
//!     .and_hms_opt(9, 15, 0)
//!     .unwrap();
//!
//! let attempt = AttendanceAttempt::new(now, Some(venue), true);
//! assert_eq!(evaluate(&schedule, &attempt, 100.0), AttendanceStatus::Marked);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod attempt;
pub mod checkin;
pub mod config;
pub mod decision;
pub mod error;
pub mod geo;
pub mod providers;
pub mod schedule;

// Re-export primary types for convenience
pub use attempt::AttendanceAttempt;
pub use checkin::{CheckInOutcome, CheckInReport, CheckInService, Clock, FixedClock, SystemClock};
pub use config::{
    default_config_path, AcquisitionConfig, AttendanceConfig, Config, ConfigError, ConfigResult,
    ServerConfig,
};
pub use decision::{
    evaluate, is_valid_radius, Assessment, AttendancePolicy, AttendanceStatus, InvalidRadius,
    DEFAULT_GEOFENCE_RADIUS_METERS,
};
pub use error::{Result, RollcallError};
pub use geo::{distance_meters, GeoError, GeoPoint, Geofence, EARTH_RADIUS_KM};
pub use providers::{
    AcquisitionError, FixedPermission, FixedPosition, PermissionProvider, PositionProvider,
    ScheduleSource, StaticScheduleSource,
};
pub use schedule::{
    format_time_of_day, is_valid_class_id, parse_time_of_day, ClassSchedule, ScheduleEntry,
    ScheduleError, TimeWindow,
};
