//! Distance calculation endpoint.

use axum::Json;
use rollcall_core::{distance_meters, GeoPoint};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Two points to measure between.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "from": {"latitude": 0.0, "longitude": 0.0},
    "to": {"latitude": 0.0, "longitude": 1.0}
}))]
pub struct DistanceRequest {
    /// First point.
    pub from: GeoPoint,
    /// Second point.
    pub to: GeoPoint,
}

/// Great-circle distance between the two points.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistanceResponse {
    /// Distance in meters.
    #[schema(example = 111_194.93)]
    pub distance_meters: f64,
}

/// Compute the great-circle distance between two points.
#[utoipa::path(
    post,
    path = "/api/distance",
    tag = "geo",
    operation_id = "distance",
    summary = "Distance between two points",
    description = "Haversine distance on a sphere of radius 6371 km, in meters.",
    request_body = DistanceRequest,
    responses(
        (status = 200, description = "Distance computed", body = DistanceResponse),
        (status = 422, description = "Invalid coordinates")
    )
)]
pub async fn distance(Json(request): Json<DistanceRequest>) -> Json<DistanceResponse> {
    Json(DistanceResponse {
        distance_meters: distance_meters(request.from, request.to),
    })
}
