//! Application configuration management.
//!
//! Configuration is read from a TOML file and may be overridden by
//! environment variables prefixed with `ROLLCALL__`, using `__` between
//! nested keys:
//!
//! ```text
//! ROLLCALL__ATTENDANCE__GEOFENCE_RADIUS_METERS=150
//! ROLLCALL__SERVER__PORT=8080
//! ```
//!
//! Covers:
//! - Geofence radius and venue timezone
//! - Permission and position acquisition timeouts
//! - HTTP server bind address
//! - Class schedules

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::{is_valid_radius, AttendancePolicy, DEFAULT_GEOFENCE_RADIUS_METERS};
use crate::schedule::{ClassSchedule, ScheduleEntry};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "ROLLCALL";

/// Separator between the prefix and nested keys in environment overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Errors from loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A source could not be parsed into [`Config`].
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] ::config::ConfigError),

    /// [`Config`] could not be serialized to TOML.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A single field is invalid.
    #[error("{field}: {message}")]
    ValidationError {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields are invalid.
    #[error("{} validation errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decision settings.
    pub attendance: AttendanceConfig,

    /// Device capability timeouts.
    pub acquisition: AcquisitionConfig,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Known class schedules.
    pub schedules: Vec<ScheduleEntry>,
}

/// Settings for the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Geofence radius in meters.
    pub geofence_radius_meters: f64,

    /// Timezone the class schedules are expressed in.
    #[serde(with = "timezone_serde")]
    pub timezone: Tz,
}

/// Timeouts for permission and position acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// How long to wait for a permission answer, in milliseconds.
    pub permission_timeout_ms: u64,

    /// How long to wait for a position fix, in milliseconds.
    pub position_timeout_ms: u64,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Use production logging (JSON files + compact stdout).
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attendance: AttendanceConfig::default(),
            acquisition: AcquisitionConfig::default(),
            server: ServerConfig::default(),
            schedules: vec![ScheduleEntry {
                class_id: "CS101".to_string(),
                start: "09:00".to_string(),
                end: "10:30".to_string(),
                latitude: 37.7749,
                longitude: -122.4194,
            }],
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            geofence_radius_meters: DEFAULT_GEOFENCE_RADIUS_METERS,
            timezone: chrono_tz::UTC,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            permission_timeout_ms: 10_000,
            position_timeout_ms: 15_000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            production: false,
        }
    }
}

impl AcquisitionConfig {
    /// Permission timeout as a [`Duration`].
    #[must_use]
    pub const fn permission_timeout(&self) -> Duration {
        Duration::from_millis(self.permission_timeout_ms)
    }

    /// Position timeout as a [`Duration`].
    #[must_use]
    pub const fn position_timeout(&self) -> Duration {
        Duration::from_millis(self.position_timeout_ms)
    }
}

impl Config {
    /// Load configuration from `path`, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file is missing, a parse
    /// error if it is malformed, or validation errors.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::build(Some(path), None)
    }

    /// Load configuration from `path` if it exists, otherwise start from the
    /// defaults. Environment overrides apply either way.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the file is malformed, or validation errors.
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::build(Some(path), None)
        } else {
            tracing::info!(path = %path.display(), "No configuration file, using defaults");
            Self::build(None, None)
        }
    }

    /// Layer the file (if any) under the environment and validate.
    ///
    /// `env` replaces the process environment when given.
    fn build(
        path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> ConfigResult<Self> {
        // Arrays merge element-wise across sources, so default schedules
        // would bleed into a file's list. Leave them to `#[serde(default)]`.
        let defaults = ::config::Config::try_from(&Self {
            schedules: Vec::new(),
            ..Self::default()
        })?;

        let mut builder = ::config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path).format(::config::FileFormat::Toml),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path` as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns a single [`ConfigError::ValidationError`] or
    /// [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if !is_valid_radius(self.attendance.geofence_radius_meters) {
            errors.push(invalid(
                "attendance.geofence_radius_meters",
                format!(
                    "must be a finite number of meters greater than zero (got {})",
                    self.attendance.geofence_radius_meters
                ),
            ));
        }
        if self.acquisition.permission_timeout_ms == 0 {
            errors.push(invalid(
                "acquisition.permission_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.acquisition.position_timeout_ms == 0 {
            errors.push(invalid(
                "acquisition.position_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.server.host.trim().is_empty() {
            errors.push(invalid("server.host", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.schedules.iter().enumerate() {
            let field = format!("schedules[{index}]");
            if let Err(e) = ClassSchedule::try_from(entry.clone()) {
                errors.push(invalid(&field, e.to_string()));
            }
            if !seen.insert(entry.class_id.as_str()) {
                errors.push(invalid(
                    &field,
                    format!("duplicate class id '{}'", entry.class_id),
                ));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// The configured schedules as validated [`ClassSchedule`]s.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid entry.
    pub fn class_schedules(&self) -> ConfigResult<Vec<ClassSchedule>> {
        self.schedules
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                ClassSchedule::try_from(entry.clone())
                    .map_err(|e| invalid(&format!("schedules[{index}]"), e.to_string()))
            })
            .collect()
    }

    /// The decision policy described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the radius is invalid.
    pub fn policy(&self) -> ConfigResult<AttendancePolicy> {
        AttendancePolicy::new(self.attendance.geofence_radius_meters)
            .map_err(|e| invalid("attendance.geofence_radius_meters", e.to_string()))
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Default configuration file location.
///
/// On Linux: `/etc/rollcall/config.toml`.
/// Elsewhere: the platform config directory, e.g. `~/.config/rollcall/`.
#[must_use]
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/etc/rollcall/config.toml")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "rollcall").map_or_else(
            || PathBuf::from("./rollcall.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }
}

mod timezone_serde {
    use chrono_tz::Tz;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> ::config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attendance.geofence_radius_meters, 100.0);
        assert_eq!(config.schedules.len(), 1);
        assert_eq!(config.class_schedules().unwrap()[0].class_id(), "CS101");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.attendance.geofence_radius_meters = 250.0;
        config.attendance.timezone = chrono_tz::America::Los_Angeles;
        config.save(&path).unwrap();

        let loaded = Config::build(Some(&path), Some(env(&[]))).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[attendance]
geofence_radius_meters = 150.0
timezone = "Europe/Berlin"
"#,
        )
        .unwrap();

        let config = Config::build(Some(&path), Some(env(&[]))).unwrap();
        assert_eq!(config.attendance.geofence_radius_meters, 150.0);
        assert_eq!(config.attendance.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.acquisition, AcquisitionConfig::default());
    }

    #[test]
    fn test_file_schedules_replace_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[[schedules]]
class_id = "PHYS210"
start = "13:00"
end = "14:15"
latitude = 51.5074
longitude = -0.1278
"#,
        )
        .unwrap();

        let config = Config::build(Some(&path), Some(env(&[]))).unwrap();
        let schedules = config.class_schedules().unwrap();
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].class_id(), "PHYS210");
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = Config::build(
            None,
            Some(env(&[
                ("ROLLCALL__ATTENDANCE__GEOFENCE_RADIUS_METERS", "175"),
                ("ROLLCALL__SERVER__PORT", "8080"),
            ])),
        )
        .unwrap();
        assert_eq!(config.attendance.geofence_radius_meters, 175.0);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_unknown_timezone_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[attendance]\ntimezone = \"Mars/Olympus\"\n").unwrap();

        let err = Config::build(Some(&path), Some(env(&[]))).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.attendance.geofence_radius_meters = -1.0;
        config.acquisition.position_timeout_ms = 0;
        config.schedules.push(ScheduleEntry {
            class_id: "CS101".to_string(),
            start: "11:00".to_string(),
            end: "10:00".to_string(),
            latitude: 0.0,
            longitude: 0.0,
        });

        match config.validate().unwrap_err() {
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                assert_eq!(messages.len(), 4, "{messages:?}");
                assert!(messages[0].starts_with("attendance.geofence_radius_meters"));
                assert!(messages[1].starts_with("acquisition.position_timeout_ms"));
                assert!(messages[2].contains("must start before it ends"));
                assert!(messages[3].contains("duplicate class id 'CS101'"));
            }
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_single_validation_error() {
        let mut config = Config::default();
        config.server.host = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "server.host"));
    }

    #[test]
    fn test_policy_uses_configured_radius() {
        let mut config = Config::default();
        config.attendance.geofence_radius_meters = 42.0;
        assert_eq!(config.policy().unwrap().geofence_radius_meters(), 42.0);
    }

    #[test]
    fn test_acquisition_durations() {
        let acquisition = AcquisitionConfig::default();
        assert_eq!(acquisition.permission_timeout(), Duration::from_secs(10));
        assert_eq!(acquisition.position_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_default_config_path_is_toml() {
        assert_eq!(
            default_config_path().extension().and_then(|e| e.to_str()),
            Some("toml")
        );
    }
}
