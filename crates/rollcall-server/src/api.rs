//! HTTP API routes and handlers.
//!
//! - `attendance` - Check-in evaluation
//! - `schedules` - Class schedule lookup
//! - `geo` - Distance calculation
//! - `config` - Geofence configuration
//! - `health` - Service health checks
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod attendance;
pub mod config;
pub mod error;
pub mod geo;
pub mod health;
pub mod openapi;
pub mod schedules;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                      - Health check
/// /api
/// ├── /attendance/check-in     - Evaluate a check-in attempt
/// ├── /schedules               - List schedules
/// ├── /schedules/{class_id}    - One schedule
/// ├── /distance                - Distance between two points
/// ├── /config                  - Attendance configuration
/// ├── /config/geofence         - Update geofence radius
/// └── /openapi.json            - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                .nest("/attendance", attendance::router())
                .nest("/schedules", schedules::router())
                .nest("/config", config::router())
                .route("/distance", post(geo::distance))
                .route("/openapi.json", get(openapi::get_openapi_spec)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
