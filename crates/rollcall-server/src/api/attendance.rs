//! Attendance check-in endpoint.
//!
//! The client acquires location permission and a position fix on the device,
//! then posts both here. The server looks up the class schedule, evaluates
//! the attempt in the configured timezone and returns the status together
//! with the text the app should show.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDateTime, Utc};
use rollcall_core::{AttendanceAttempt, AttendanceStatus, GeoPoint, ScheduleSource};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the attendance router.
pub fn router() -> Router<SharedState> {
    Router::new().route("/check-in", post(check_in))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A check-in attempt reported by the device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "class_id": "CS101",
    "permission_granted": true,
    "position": {"latitude": 37.7749, "longitude": -122.4194},
    "timestamp": "2025-01-15T17:30:00Z"
}))]
pub struct CheckInRequest {
    /// Class being checked into.
    #[schema(example = "CS101")]
    pub class_id: String,

    /// Whether the user granted location permission.
    #[schema(example = true)]
    pub permission_granted: bool,

    /// Device position. Omit if acquisition failed.
    #[serde(default)]
    #[schema(nullable)]
    pub position: Option<GeoPoint>,

    /// When the attempt was made, as reported by the device. Trusted as-is;
    /// defaults to the server's clock when omitted.
    #[serde(default)]
    #[schema(nullable, example = "2025-01-15T17:30:00Z")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Result of a check-in attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "attempt_id": "0a6f2c1e-3f3a-4c55-9a55-2a4f1c9d2b7e",
    "class_id": "CS101",
    "status": "marked",
    "title": "Success",
    "message": "Attendance marked successfully!",
    "evaluated_at_local": "2025-01-15T09:30:00",
    "window_start_local": "2025-01-15T09:00:00",
    "window_end_local": "2025-01-15T10:30:00",
    "distance_meters": 12.4,
    "geofence_radius_meters": 100.0
}))]
pub struct CheckInResponse {
    /// Correlation id of the evaluated attempt.
    pub attempt_id: Uuid,

    /// Class that was checked into.
    #[schema(example = "CS101")]
    pub class_id: String,

    /// Decision.
    pub status: AttendanceStatus,

    /// Short heading for the app to display.
    #[schema(example = "Success")]
    pub title: String,

    /// Message for the app to display.
    #[schema(example = "Attendance marked successfully!")]
    pub message: String,

    /// Attempt time in the venue's timezone.
    #[schema(example = "2025-01-15T09:30:00")]
    pub evaluated_at_local: String,

    /// Start of the class window on the attempt's date, if checked.
    #[schema(nullable, example = "2025-01-15T09:00:00")]
    pub window_start_local: Option<String>,

    /// End of the class window on the attempt's date, if checked.
    #[schema(nullable, example = "2025-01-15T10:30:00")]
    pub window_end_local: Option<String>,

    /// Distance to the class location, if checked.
    #[schema(nullable, example = 12.4)]
    pub distance_meters: Option<f64>,

    /// Geofence radius in effect.
    #[schema(example = 100.0)]
    pub geofence_radius_meters: f64,
}

/// User-facing text for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    /// Heading.
    pub title: &'static str,
    /// Body.
    pub message: &'static str,
}

/// Text the app shows for each status.
#[must_use]
pub const fn status_message(status: AttendanceStatus) -> StatusMessage {
    let (title, message) = match status {
        AttendanceStatus::Marked => ("Success", "Attendance marked successfully!"),
        AttendanceStatus::OutsideGeofence => {
            ("Out of Range", "You are not within the class location.")
        }
        AttendanceStatus::OutsideTimeWindow => (
            "Outside Time",
            "You can only mark attendance during class hours.",
        ),
        AttendanceStatus::PermissionDenied => (
            "Location Permission Required",
            "Please enable location services for this app in your device settings.",
        ),
        AttendanceStatus::EvaluationError => {
            ("Error", "Failed to mark attendance. Please try again.")
        }
        AttendanceStatus::NotAttempted => ("Not Marked", "Attendance has not been marked yet."),
    };
    StatusMessage { title, message }
}

// ============================================================================
// Handlers
// ============================================================================

/// Evaluate a check-in attempt.
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    tag = "attendance",
    operation_id = "checkIn",
    summary = "Evaluate a check-in attempt",
    description = "Evaluates one check-in against the class schedule. Checks run in \
        order: permission, position present, time window (inclusive), then geofence. \
        Every decision, including refusals, is returned with status 200. \
        A supplied `timestamp` is taken as the device's clock and trusted as-is; \
        the window check runs against it, not against server time. Omit it to \
        evaluate at the time the request is received.",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Attempt evaluated", body = CheckInResponse),
        (status = 404, description = "Unknown class", body = ErrorResponse),
        (status = 422, description = "Malformed request or invalid coordinates")
    )
)]
pub async fn check_in(
    State(state): State<SharedState>,
    Json(request): Json<CheckInRequest>,
) -> ApiResult<Json<CheckInResponse>> {
    let state_guard = state.read().await;

    let schedule = state_guard.schedules.schedule_for(&request.class_id).await?;
    let attempt = AttendanceAttempt::from_utc(
        request.timestamp.unwrap_or_else(Utc::now),
        state_guard.config.attendance.timezone,
        request.position,
        request.permission_granted,
    );
    let assessment = state_guard.policy.assess(&schedule, &attempt);
    let text = status_message(assessment.status);

    tracing::info!(
        class_id = %request.class_id,
        attempt_id = %attempt.id,
        status = %assessment.status,
        "Check-in evaluated"
    );

    Ok(Json(CheckInResponse {
        attempt_id: attempt.id,
        class_id: request.class_id,
        status: assessment.status,
        title: text.title.to_string(),
        message: text.message.to_string(),
        evaluated_at_local: format_local(attempt.timestamp),
        window_start_local: assessment.window.map(|w| format_local(w.start)),
        window_end_local: assessment.window.map(|w| format_local(w.end)),
        distance_meters: assessment.distance_meters,
        geofence_radius_meters: assessment.geofence_radius_meters,
    }))
}

fn format_local(instant: NaiveDateTime) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S").to_string()
}
