use axum::{http::StatusCode, Json};
use crate::db;
use crate::models::HealthResponse;
use tracing::debug;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint
pub async fn ready_check() -> (StatusCode, Json<HealthResponse>) {
    debug!("Readiness check requested");
    // Joins cannot be authorized and mutations cannot be confirmed while
    // the relational store is unreachable.
    let db_ok = match db::dbschema::get_db() {
        Some(db) => sqlx::query("SELECT 1").execute(db.pool()).await.is_ok(),
        None => false,
    };
    if !db_ok {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                message: "Database is not reachable".to_string(),
            }),
        );
    }
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            message: "Service is ready".to_string(),
        }),
    )
}
