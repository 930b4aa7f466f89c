//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rollcall_core::{AttendancePolicy, Config, StaticScheduleSource};
use tokio::sync::RwLock;

/// Handle to the application state passed to every handler.
pub type SharedState = Arc<RwLock<AppState>>;

/// Configuration and everything derived from it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Active configuration.
    pub config: Config,

    /// Where the configuration is persisted. `None` keeps changes in memory.
    pub config_path: Option<PathBuf>,

    /// Schedules built from `config.schedules`.
    pub schedules: StaticScheduleSource,

    /// Decision policy built from `config.attendance`.
    pub policy: AttendancePolicy,
}

impl AppState {
    /// Build state from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedules or the geofence radius are invalid.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> rollcall_core::Result<Self> {
        let schedules = StaticScheduleSource::from_config(&config)?;
        let policy = config.policy()?;
        Ok(Self {
            config,
            config_path,
            schedules,
            policy,
        })
    }

    /// Load configuration from `path` (defaults if missing) and build state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or invalid.
    pub fn load(path: impl AsRef<Path>) -> rollcall_core::Result<Self> {
        let path = path.as_ref();
        let config = Config::load_or_default(path)?;
        Self::new(config, Some(path.to_path_buf()))
    }

    /// Wrap into the handle handlers receive.
    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Change the geofence radius used by subsequent check-ins.
    ///
    /// # Errors
    ///
    /// Returns [`rollcall_core::RollcallError::InvalidRadius`] and leaves the
    /// state untouched if the radius is not positive and finite.
    pub fn set_geofence_radius(&mut self, radius_meters: f64) -> rollcall_core::Result<()> {
        self.policy = AttendancePolicy::new(radius_meters)?;
        self.config.attendance.geofence_radius_meters = radius_meters;
        Ok(())
    }

    /// Persist the configuration, if a path is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_config(&self) -> rollcall_core::Result<()> {
        if let Some(path) = &self.config_path {
            self.config.save(path)?;
        }
        Ok(())
    }
}
