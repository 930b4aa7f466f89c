//! Class schedule endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use rollcall_core::{RollcallError, ScheduleEntry};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Creates the schedules router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_schedules))
        .route("/{class_id}", get(get_schedule))
}

/// All configured schedules.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchedulesResponse {
    /// Schedules ordered by class id.
    pub schedules: Vec<ScheduleEntry>,

    /// Number of schedules.
    #[schema(example = 1)]
    pub count: usize,
}

/// List all class schedules.
#[utoipa::path(
    get,
    path = "/api/schedules",
    tag = "schedules",
    operation_id = "listSchedules",
    summary = "List class schedules",
    responses(
        (status = 200, description = "Schedules listed", body = SchedulesResponse)
    )
)]
pub async fn list_schedules(State(state): State<SharedState>) -> Json<SchedulesResponse> {
    let state_guard = state.read().await;
    let schedules: Vec<ScheduleEntry> = state_guard.schedules.iter().map(ScheduleEntry::from).collect();

    Json(SchedulesResponse {
        count: schedules.len(),
        schedules,
    })
}

/// Get the schedule for one class.
#[utoipa::path(
    get,
    path = "/api/schedules/{class_id}",
    tag = "schedules",
    operation_id = "getSchedule",
    summary = "Get a class schedule",
    params(
        ("class_id" = String, Path, description = "Class identifier", example = "CS101")
    ),
    responses(
        (status = 200, description = "Schedule found", body = ScheduleEntry),
        (status = 404, description = "Unknown class", body = ErrorResponse)
    )
)]
pub async fn get_schedule(
    State(state): State<SharedState>,
    Path(class_id): Path<String>,
) -> ApiResult<Json<ScheduleEntry>> {
    let state_guard = state.read().await;
    let schedule = state_guard
        .schedules
        .get(&class_id)
        .ok_or(RollcallError::ScheduleNotFound(class_id.clone()))?;

    Ok(Json(ScheduleEntry::from(schedule)))
}
