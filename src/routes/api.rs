use crate::{handlers::{diagnostics, session_info}, routes::auth_middleware::auth_middleware, AppState};
use axum::{routing::get, middleware, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/sessions/:schema_id", get(session_info))
        .route_layer(middleware::from_fn(auth_middleware)) // Applies to all routes added above
        .with_state(state)
}
