//! Class schedules and their daily time windows.
//!
//! A [`ClassSchedule`] names a class, the wall-clock window during which
//! attendance can be marked, and the location students must be at. The
//! window is a time of day only: it is anchored to the calendar date of each
//! attempt when evaluated.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::geo::{GeoError, GeoPoint};

/// Maximum length of a class identifier.
pub const MAX_CLASS_ID_LENGTH: usize = 64;

static CLASS_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$").expect("class id pattern is valid")
});

/// Returns `true` if `id` is usable as a class identifier.
///
/// Identifiers start with an ASCII letter or digit and may contain letters,
/// digits, `_`, `.` and `-`, up to [`MAX_CLASS_ID_LENGTH`] characters.
#[must_use]
pub fn is_valid_class_id(id: &str) -> bool {
    CLASS_ID_RE.is_match(id)
}

/// Parse a time of day in `HH:MM` or `HH:MM:SS` form.
#[must_use]
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Format a time of day as `HH:MM`, or `HH:MM:SS` when seconds are set.
#[must_use]
pub fn format_time_of_day(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

/// Errors raised while building a [`ClassSchedule`].
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    /// A start or end time could not be parsed.
    #[error("Invalid time of day '{0}'. Expected 'HH:MM' or 'HH:MM:SS' (e.g., '09:00').")]
    InvalidTime(String),

    /// The window is empty or inverted.
    #[error("Class window must start before it ends (start {start}, end {end})")]
    InvertedWindow {
        /// Configured start.
        start: NaiveTime,
        /// Configured end.
        end: NaiveTime,
    },

    /// A start or end time has a fractional second.
    #[error("Class times must be whole seconds (got {0})")]
    SubsecondTime(NaiveTime),

    /// The class identifier is empty or contains unsupported characters.
    #[error("Invalid class id '{0}'. Use letters, digits, '_', '.' or '-' (max 64 characters).")]
    InvalidClassId(String),

    /// The class location is not a valid coordinate.
    #[error("Invalid class location: {0}")]
    InvalidLocation(#[from] GeoError),
}

/// A closed interval of local date-times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First eligible instant.
    pub start: NaiveDateTime,
    /// Last eligible instant.
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Whether `instant` falls inside the window, boundaries included.
    #[must_use]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// A class session: when and where attendance is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleEntry", into = "ScheduleEntry")]
pub struct ClassSchedule {
    class_id: String,
    start: NaiveTime,
    end: NaiveTime,
    location: GeoPoint,
}

impl ClassSchedule {
    /// Create a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidClassId`] for a malformed id,
    /// [`ScheduleError::SubsecondTime`] if either bound has a fractional
    /// second, and [`ScheduleError::InvertedWindow`] unless `start < end`.
    pub fn new(
        class_id: impl Into<String>,
        start: NaiveTime,
        end: NaiveTime,
        location: GeoPoint,
    ) -> Result<Self, ScheduleError> {
        let class_id = class_id.into();
        if !is_valid_class_id(&class_id) {
            return Err(ScheduleError::InvalidClassId(class_id));
        }
        for time in [start, end] {
            if time.nanosecond() != 0 {
                return Err(ScheduleError::SubsecondTime(time));
            }
        }
        if start >= end {
            return Err(ScheduleError::InvertedWindow { start, end });
        }
        Ok(Self {
            class_id,
            start,
            end,
            location,
        })
    }

    /// Create a schedule from `HH:MM` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTime`] if either time fails to parse,
    /// plus everything [`ClassSchedule::new`] rejects.
    pub fn parse(
        class_id: impl Into<String>,
        start: &str,
        end: &str,
        location: GeoPoint,
    ) -> Result<Self, ScheduleError> {
        let start_time =
            parse_time_of_day(start).ok_or_else(|| ScheduleError::InvalidTime(start.to_string()))?;
        let end_time =
            parse_time_of_day(end).ok_or_else(|| ScheduleError::InvalidTime(end.to_string()))?;
        Self::new(class_id, start_time, end_time, location)
    }

    /// Class identifier.
    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Start of the daily window.
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// End of the daily window.
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// Required check-in location.
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        self.location
    }

    /// The window anchored to a calendar date.
    #[must_use]
    pub fn window_on(&self, date: NaiveDate) -> TimeWindow {
        TimeWindow {
            start: date.and_time(self.start),
            end: date.and_time(self.end),
        }
    }
}

/// Serialized form of a [`ClassSchedule`], as found in configuration files
/// and API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "class_id": "CS101",
    "start": "09:00",
    "end": "10:30",
    "latitude": 37.7749,
    "longitude": -122.4194
}))]
pub struct ScheduleEntry {
    /// Class identifier.
    #[schema(example = "CS101")]
    pub class_id: String,

    /// Window start, `HH:MM` or `HH:MM:SS`.
    #[schema(example = "09:00")]
    pub start: String,

    /// Window end, `HH:MM` or `HH:MM:SS`.
    #[schema(example = "10:30")]
    pub end: String,

    /// Latitude of the class location.
    pub latitude: f64,

    /// Longitude of the class location.
    pub longitude: f64,
}

impl TryFrom<ScheduleEntry> for ClassSchedule {
    type Error = ScheduleError;

    fn try_from(entry: ScheduleEntry) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(entry.latitude, entry.longitude)?;
        Self::parse(entry.class_id, &entry.start, &entry.end, location)
    }
}

impl From<ClassSchedule> for ScheduleEntry {
    fn from(schedule: ClassSchedule) -> Self {
        Self::from(&schedule)
    }
}

impl From<&ClassSchedule> for ScheduleEntry {
    fn from(schedule: &ClassSchedule) -> Self {
        Self {
            class_id: schedule.class_id.clone(),
            start: format_time_of_day(schedule.start),
            end: format_time_of_day(schedule.end),
            latitude: schedule.location.latitude(),
            longitude: schedule.location.longitude(),
        }
    }
}
