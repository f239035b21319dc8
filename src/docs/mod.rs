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
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Database is not reachable", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Diagnostics for the collaboration engine
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Live engine and host statistics", body = DiagnosticsResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Live participant state for one collaboration session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{schema_id}",
    params(
        ("schema_id" = String, Path, description = "Schema the session is bound to")
    ),
    responses(
        (status = 200, description = "Session participants", body = SessionInfoResponse),
        (status = 403, description = "User is not a workspace member", body = ErrorResponse),
        (status = 404, description = "No live session for the schema", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn session_info_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        session_info_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, SessionInfoResponse, ErrorResponse)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
