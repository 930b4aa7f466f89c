//! Unified error types for the rollcall core library.
//!
//! Each module has its own specific error type (`GeoError`, `ScheduleError`,
//! `ConfigError`, `AcquisitionError`); [`RollcallError`] covers all of them
//! for callers that just need to propagate.
//!
//! Attendance refusals (outside the window, outside the geofence, permission
//! denied) are not errors. They are [`AttendanceStatus`](crate::AttendanceStatus)
//! values returned by the decision engine.
//!
//! # Example
//!
//! ```rust
//! use rollcall_core::error::{RollcallError, Result};
//!
//! fn require_class(id: &str, known: &[&str]) -> Result<()> {
//!     if !known.contains(&id) {
//!         return Err(RollcallError::ScheduleNotFound(id.to_string()));
//!     }
//!     Ok(())
//! }
//! # assert!(require_class("CS101", &["CS101"]).is_ok());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::decision::InvalidRadius;
use crate::geo::GeoError;
use crate::providers::AcquisitionError;
use crate::schedule::ScheduleError;

/// The unified error type for all rollcall operations.
#[derive(Debug, Error)]
pub enum RollcallError {
    // =========================================================================
    // INPUT VALIDATION ERRORS
    // =========================================================================
    /// A coordinate was out of range.
    #[error("{0}")]
    InvalidCoordinate(GeoError),

    /// A geofence radius was not a positive, finite number.
    #[error("{0}")]
    InvalidRadius(InvalidRadius),

    // =========================================================================
    // SCHEDULE ERRORS
    // =========================================================================
    /// A schedule could not be constructed.
    #[error("Invalid class schedule: {0}")]
    InvalidSchedule(ScheduleError),

    /// No schedule exists for the requested class.
    #[error("No schedule found for class '{0}'. Check the class id or the configured schedules.")]
    ScheduleNotFound(String),

    // =========================================================================
    // ACQUISITION ERRORS
    // =========================================================================
    /// Permission or position could not be acquired.
    #[error("Location acquisition failed: {0}")]
    Acquisition(AcquisitionError),

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // PERSISTENCE & I/O ERRORS
    // =========================================================================
    /// An error occurred while persisting or reading data.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for rollcall operations.
pub type Result<T> = std::result::Result<T, RollcallError>;

impl RollcallError {
    /// Returns `true` if this error is related to class schedules.
    #[inline]
    #[must_use]
    pub const fn is_schedule_error(&self) -> bool {
        matches!(self, Self::InvalidSchedule(_) | Self::ScheduleNotFound(_))
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns `true` if this error is related to I/O or persistence.
    #[inline]
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::PersistenceError(_) | Self::IoError(_))
    }

    /// Returns `true` if retrying the same operation may succeed.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Acquisition(AcquisitionError::TimedOut { .. } | AcquisitionError::Unavailable(_))
        )
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidCoordinate(_) | Self::InvalidRadius(_) | Self::InvalidSchedule(_) => 400,
            Self::ScheduleNotFound(_) | Self::ConfigNotFound(_) => 404,
            Self::ConfigParseError(_) | Self::ConfigValidationError(_) => 422,
            Self::PersistenceError(_) | Self::IoError(_) => 500,
            Self::Acquisition(_) => 503,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCoordinate(_) => "INVALID_COORDINATE",
            Self::InvalidRadius(_) => "INVALID_RADIUS",
            Self::InvalidSchedule(_) => "INVALID_SCHEDULE",
            Self::ScheduleNotFound(_) => "SCHEDULE_NOT_FOUND",
            Self::Acquisition(_) => "ACQUISITION_FAILED",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::PersistenceError(_) => "PERSISTENCE_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<GeoError> for RollcallError {
    fn from(err: GeoError) -> Self {
        Self::InvalidCoordinate(err)
    }
}

impl From<InvalidRadius> for RollcallError {
    fn from(err: InvalidRadius) -> Self {
        Self::InvalidRadius(err)
    }
}

impl From<ScheduleError> for RollcallError {
    fn from(err: ScheduleError) -> Self {
        Self::InvalidSchedule(err)
    }
}

impl From<AcquisitionError> for RollcallError {
    fn from(err: AcquisitionError) -> Self {
        Self::Acquisition(err)
    }
}

impl From<crate::config::ConfigError> for RollcallError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::ReadError { path, source } => {
                Self::PersistenceError(format!("Failed to read {}: {}", path.display(), source))
            }
            ConfigError::WriteError { path, source } => {
                Self::PersistenceError(format!("Failed to write {}: {}", path.display(), source))
            }
            ConfigError::ParseError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::SerializeError(e) => Self::ConfigParseError(e.to_string()),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
