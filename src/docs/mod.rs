use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Gateway diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Gateway and system counters", body = DiagnosticsResponse),
        (status = 403, description = "Cloud Admin access required", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Relay a backend job-progress event into a room
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_key}/progress",
    request_body = ProgressEvent,
    params(
        ("room_key" = String, Path, description = "Project id the room is keyed by")
    ),
    responses(
        (status = 202, description = "Progress relayed to current room members", body = ProgressAccepted),
        (status = 403, description = "Service access required", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn relay_progress_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        relay_progress_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, ErrorResponse, ProgressEvent, ProgressAccepted, JobType)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
