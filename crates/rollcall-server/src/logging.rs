//! Logging initialization.
//!
//! - **Production**: JSON logs to daily rolling files plus compact stdout
//!   for the service manager's journal.
//! - **Development**: pretty stdout with span open/close events.
//!
//! The filter comes from `RUST_LOG` if set, otherwise `ROLLCALL_LOG_LEVEL`,
//! otherwise `info`.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the fallback log filter.
pub const LOG_LEVEL_ENV: &str = "ROLLCALL_LOG_LEVEL";

/// Non-blocking writer guards; dropping them stops log delivery.
static GUARDS: OnceLock<(WorkerGuard, WorkerGuard)> = OnceLock::new();

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log directory cannot be
/// created, or a subscriber is already installed.
pub fn init(production: bool) -> anyhow::Result<()> {
    let filter = env_filter()?;

    if production {
        let log_dir = log_directory();
        std::fs::create_dir_all(&log_dir)?;

        let (file_writer, file_guard) =
            tracing_appender::non_blocking(RollingFileAppender::new(Rotation::DAILY, &log_dir, "rollcall"));
        let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(stdout_writer)
                    .with_target(true)
                    .with_ansi(false),
            )
            .try_init()?;

        let _ = GUARDS.set((file_guard, stdout_guard));
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
            )
            .try_init()?;
    }

    Ok(())
}

fn env_filter() -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    Ok(EnvFilter::try_new(level)?)
}

/// Directory for production log files.
///
/// On Linux: `/var/log/rollcall`. Elsewhere: a `logs` folder in the
/// platform data directory.
#[must_use]
pub fn log_directory() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/var/log/rollcall")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "rollcall")
            .map_or_else(|| PathBuf::from("./logs"), |dirs| dirs.data_dir().join("logs"))
    }
}
