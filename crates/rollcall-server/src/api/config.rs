//! Configuration endpoints.
//!
//! Only the geofence radius can be changed at runtime. Schedules and the
//! timezone are read from the configuration file at startup.

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the config router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(get_config))
        .route("/geofence", put(update_geofence))
}

/// Active attendance configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "geofence_radius_meters": 100.0,
    "timezone": "America/Los_Angeles",
    "permission_timeout_ms": 10000,
    "position_timeout_ms": 15000,
    "schedule_count": 1
}))]
pub struct ConfigResponse {
    /// Geofence radius in meters.
    #[schema(example = 100.0)]
    pub geofence_radius_meters: f64,

    /// IANA timezone schedules are expressed in.
    #[schema(example = "America/Los_Angeles")]
    pub timezone: String,

    /// Permission request timeout in milliseconds.
    #[schema(example = 10000)]
    pub permission_timeout_ms: u64,

    /// Position fix timeout in milliseconds.
    #[schema(example = 15000)]
    pub position_timeout_ms: u64,

    /// Number of configured schedules.
    #[schema(example = 1)]
    pub schedule_count: usize,
}

/// Request to change the geofence radius.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"radius_meters": 150.0}))]
pub struct UpdateGeofenceRequest {
    /// New radius in meters. Must be finite and greater than zero.
    #[schema(example = 150.0, exclusive_minimum = 0)]
    pub radius_meters: f64,
}

/// Response after changing the geofence radius.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateGeofenceResponse {
    /// Whether the change was applied.
    #[schema(example = true)]
    pub success: bool,

    /// Radius now in effect.
    #[schema(example = 150.0)]
    pub radius_meters: f64,
}

/// Get the active attendance configuration.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "config",
    operation_id = "getConfig",
    summary = "Get attendance configuration",
    responses(
        (status = 200, description = "Configuration retrieved", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    let state_guard = state.read().await;
    let config = &state_guard.config;

    Json(ConfigResponse {
        geofence_radius_meters: state_guard.policy.geofence_radius_meters(),
        timezone: config.attendance.timezone.name().to_string(),
        permission_timeout_ms: config.acquisition.permission_timeout_ms,
        position_timeout_ms: config.acquisition.position_timeout_ms,
        schedule_count: state_guard.schedules.len(),
    })
}

/// Change the geofence radius.
#[utoipa::path(
    put,
    path = "/api/config/geofence",
    tag = "config",
    operation_id = "updateGeofence",
    summary = "Update geofence radius",
    description = "Sets the radius used by subsequent check-ins and saves it to the \
        configuration file.",
    request_body = UpdateGeofenceRequest,
    responses(
        (status = 200, description = "Radius updated", body = UpdateGeofenceResponse),
        (status = 400, description = "Invalid radius", body = ErrorResponse),
        (status = 500, description = "Configuration could not be saved", body = ErrorResponse)
    )
)]
pub async fn update_geofence(
    State(state): State<SharedState>,
    Json(request): Json<UpdateGeofenceRequest>,
) -> ApiResult<Json<UpdateGeofenceResponse>> {
    let mut state_guard = state.write().await;
    let previous = state_guard.policy.geofence_radius_meters();

    state_guard.set_geofence_radius(request.radius_meters)?;

    if let Err(e) = state_guard.save_config() {
        state_guard.set_geofence_radius(previous)?;
        return Err(ApiError::InternalError {
            error_code: "config_save_failed".to_string(),
            message: "Failed to save configuration".to_string(),
            details: Some(e.to_string()),
        });
    }

    tracing::info!(
        previous_m = previous,
        radius_m = request.radius_meters,
        "Geofence radius updated"
    );

    Ok(Json(UpdateGeofenceResponse {
        success: true,
        radius_meters: request.radius_meters,
    }))
}
