//! Check-in sequencing: acquire permission, then position, then evaluate.
//!
//! Each call to [`CheckInService::check_in`] is one user action. Actions take
//! a ticket from a shared counter when they start; if a newer action starts
//! while an older one is still waiting on the device, the older result is
//! dropped as [`CheckInOutcome::Superseded`] and never evaluated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::attempt::AttendanceAttempt;
use crate::config::{AcquisitionConfig, Config};
use crate::decision::{Assessment, AttendancePolicy};
use crate::error::Result;
use crate::geo::GeoPoint;
use crate::providers::{AcquisitionError, PermissionProvider, PositionProvider, ScheduleSource};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// An evaluated check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInReport {
    /// Ticket this check-in ran under.
    pub ticket: u64,
    /// The attempt that was evaluated.
    pub attempt: AttendanceAttempt,
    /// Decision and measurements.
    pub assessment: Assessment,
    /// Why permission was not granted, if it wasn't.
    pub permission_failure: Option<AcquisitionError>,
    /// Why no position was obtained, if none was.
    pub position_failure: Option<AcquisitionError>,
}

/// Result of one check-in action.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    /// Permission and position were resolved and the attempt was evaluated.
    Evaluated(CheckInReport),
    /// A newer check-in started before this one finished acquiring.
    Superseded {
        /// This check-in's ticket.
        ticket: u64,
        /// The newest ticket issued.
        latest: u64,
    },
}

impl CheckInOutcome {
    /// The report, if the attempt was evaluated.
    #[must_use]
    pub const fn report(&self) -> Option<&CheckInReport> {
        match self {
            Self::Evaluated(report) => Some(report),
            Self::Superseded { .. } => None,
        }
    }
}

/// Runs check-ins against device capabilities and a schedule source.
#[derive(Debug)]
pub struct CheckInService<P, L, S, C = SystemClock> {
    permissions: P,
    positions: L,
    schedules: S,
    clock: C,
    policy: AttendancePolicy,
    timezone: Tz,
    acquisition: AcquisitionConfig,
    generation: AtomicU64,
}

impl<P, L, S> CheckInService<P, L, S>
where
    P: PermissionProvider,
    L: PositionProvider,
    S: ScheduleSource,
{
    /// Create a service using the settings in `config` and the system clock.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the geofence radius is invalid.
    pub fn new(permissions: P, positions: L, schedules: S, config: &Config) -> Result<Self> {
        Ok(Self {
            permissions,
            positions,
            schedules,
            clock: SystemClock,
            policy: config.policy()?,
            timezone: config.attendance.timezone,
            acquisition: config.acquisition.clone(),
            generation: AtomicU64::new(0),
        })
    }
}

impl<P, L, S, C> CheckInService<P, L, S, C>
where
    P: PermissionProvider,
    L: PositionProvider,
    S: ScheduleSource,
    C: Clock,
{
    /// Replace the clock.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> CheckInService<P, L, S, C2> {
        CheckInService {
            permissions: self.permissions,
            positions: self.positions,
            schedules: self.schedules,
            clock,
            policy: self.policy,
            timezone: self.timezone,
            acquisition: self.acquisition,
            generation: self.generation,
        }
    }

    /// The newest ticket issued so far, `0` before the first check-in.
    pub fn latest_ticket(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Run one check-in for `class_id`.
    ///
    /// Permission is requested first; position is only requested once
    /// permission is granted. Acquisition failures become part of the
    /// attempt (no permission, or no position) rather than errors.
    ///
    /// # Errors
    ///
    /// Returns an error only if the schedule cannot be fetched.
    pub async fn check_in(&self, class_id: &str) -> Result<CheckInOutcome> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let schedule = self.schedules.schedule_for(class_id).await?;

        let (permission_granted, permission_failure) = self.acquire_permission().await;
        let (position, position_failure) = if permission_granted {
            self.acquire_position().await
        } else {
            (None, None)
        };

        let latest = self.latest_ticket();
        if latest != ticket {
            info!(class_id, ticket, latest, "Discarding superseded check-in");
            return Ok(CheckInOutcome::Superseded { ticket, latest });
        }

        let attempt =
            AttendanceAttempt::from_utc(self.clock.now(), self.timezone, position, permission_granted);
        let assessment = self.policy.assess(&schedule, &attempt);
        info!(
            class_id,
            ticket,
            attempt_id = %attempt.id,
            status = %assessment.status,
            "Check-in evaluated"
        );

        Ok(CheckInOutcome::Evaluated(CheckInReport {
            ticket,
            attempt,
            assessment,
            permission_failure,
            position_failure,
        }))
    }

    async fn acquire_permission(&self) -> (bool, Option<AcquisitionError>) {
        let limit = self.acquisition.permission_timeout();
        match timeout(limit, self.permissions.request_location_permission()).await {
            Ok(Ok(true)) => (true, None),
            Ok(Ok(false)) => (false, Some(AcquisitionError::Denied)),
            Ok(Err(e)) => {
                warn!(error = %e, "Location permission unavailable");
                (false, Some(e))
            }
            Err(_) => {
                warn!(timeout_ms = millis(limit), "Location permission request timed out");
                (false, Some(AcquisitionError::TimedOut { after_ms: millis(limit) }))
            }
        }
    }

    async fn acquire_position(&self) -> (Option<GeoPoint>, Option<AcquisitionError>) {
        let limit = self.acquisition.position_timeout();
        match timeout(limit, self.positions.current_position()).await {
            Ok(Ok(point)) => (Some(point), None),
            Ok(Err(e)) => {
                warn!(error = %e, "Position acquisition failed");
                (None, Some(e))
            }
            Err(_) => {
                warn!(timeout_ms = millis(limit), "Position acquisition timed out");
                (None, Some(AcquisitionError::TimedOut { after_ms: millis(limit) }))
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
