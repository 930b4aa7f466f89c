//! OpenAPI specification generation for the rollcall API.

use axum::Json;
use rollcall_core::{AttendanceStatus, GeoPoint, ScheduleEntry};
use utoipa::OpenApi;

use super::attendance::{CheckInRequest, CheckInResponse};
use super::config::{ConfigResponse, UpdateGeofenceRequest, UpdateGeofenceResponse};
use super::error::ErrorResponse;
use super::geo::{DistanceRequest, DistanceResponse};
use super::health::HealthResponse;
use super::schedules::SchedulesResponse;

/// Serve the OpenAPI specification as JSON at `/api/openapi.json`.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The OpenAPI specification as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for rollcall.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rollcall API",
        version = "0.1.0",
        description = r#"
# rollcall API

rollcall verifies class attendance check-ins by time and place.

## Check-in decision

Each check-in is evaluated in a fixed order, and the first failing check decides the status:

1. `permission_denied` - location permission was not granted
2. `evaluation_error` - permission was granted but no position was supplied
3. `outside_time_window` - the attempt is before the class starts or after it ends (both ends inclusive)
4. `outside_geofence` - the position is farther from the class than the geofence radius
5. `marked` - attendance is valid

All of these are successful responses. Only unknown classes and malformed requests return error statuses.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local rollcall server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "attendance", description = "Check-in evaluation"),
        (name = "schedules", description = "Class schedules"),
        (name = "geo", description = "Geographic utilities"),
        (name = "config", description = "Geofence and acquisition settings")
    ),
    paths(
        super::health::health_check,
        super::attendance::check_in,
        super::schedules::list_schedules,
        super::schedules::get_schedule,
        super::geo::distance,
        super::config::get_config,
        super::config::update_geofence,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            GeoPoint,
            AttendanceStatus,
            ScheduleEntry,
            CheckInRequest,
            CheckInResponse,
            SchedulesResponse,
            DistanceRequest,
            DistanceResponse,
            ConfigResponse,
            UpdateGeofenceRequest,
            UpdateGeofenceResponse,
        )
    )
)]
pub struct ApiDoc;
