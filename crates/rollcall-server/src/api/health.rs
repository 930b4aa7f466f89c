//! Liveness and readiness.
//!
//! The server is `degraded` while no class schedules are loaded: it stays up,
//! but every check-in would be answered with 404.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{AppState, SharedState};

/// Creates the health router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(health_check))
}

/// Service health.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "ok",
    "version": "0.1.0",
    "schedules": 1,
    "timezone": "UTC"
}))]
pub struct HealthResponse {
    /// `ok`, or `degraded` when no schedules are loaded.
    #[schema(example = "ok")]
    pub status: String,

    /// Crate version.
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Loaded class schedules.
    #[schema(example = 1)]
    pub schedules: usize,

    /// Timezone check-ins are evaluated in.
    #[schema(example = "UTC")]
    pub timezone: String,
}

impl From<&AppState> for HealthResponse {
    fn from(state: &AppState) -> Self {
        let schedules = state.schedules.len();
        Self {
            status: if schedules == 0 { "degraded" } else { "ok" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            schedules,
            timezone: state.config.attendance.timezone.name().to_string(),
        }
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    operation_id = "healthCheck",
    summary = "Check service health",
    description = "Reports version, loaded schedules and the evaluation timezone. \
        Status is `degraded` when no schedules are configured.",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse::from(&*state.read().await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::Config;

    #[test]
    fn test_no_schedules_is_degraded() {
        let config = Config {
            schedules: Vec::new(),
            ..Config::default()
        };
        let state = AppState::new(config, None).unwrap();
        let health = HealthResponse::from(&state);
        assert_eq!(health.status, "degraded");
        assert_eq!(health.schedules, 0);
    }

    #[test]
    fn test_default_config_is_ok() {
        let state = AppState::new(Config::default(), None).unwrap();
        let health = HealthResponse::from(&state);
        assert_eq!(health.status, "ok");
        assert_eq!(health.timezone, "UTC");
    }
}
