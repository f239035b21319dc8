use axum::{extract::{Extension, Path, State}, http::StatusCode, Json};
use std::sync::Arc;
use tracing::error;

use crate::models::{ErrorResponse, SessionInfoResponse};
use crate::AppState;

fn error_body(status: StatusCode, error: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error,
        }),
    )
}

/// Live participant state for one collaboration session
pub async fn session_info(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<String>,
    Path(schema_id): Path<String>,
) -> Result<(StatusCode, Json<SessionInfoResponse>), (StatusCode, Json<ErrorResponse>)> {
    // Same membership rule as joining the session itself.
    let is_member = match app_state.store.is_schema_member(&user_id, &schema_id).await {
        Ok(is_member) => is_member,
        Err(e) => {
            error!("Membership lookup failed for schema '{}': {}", schema_id, e);
            return Err(error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to resolve membership".to_string(),
            ));
        }
    };
    if !is_member {
        return Err(error_body(
            StatusCode::FORBIDDEN,
            "Unauthorized".to_string(),
        ));
    }

    let session = match app_state.sessions.get(&schema_id) {
        Some(session) => session,
        None => {
            return Err(error_body(
                StatusCode::NOT_FOUND,
                format!("No live session for schema '{}'", schema_id),
            ));
        }
    };

    Ok((
        StatusCode::OK,
        Json(SessionInfoResponse {
            schema_id: session.schema_id().to_string(),
            participants: session.participant_ids(),
            last_active: session.last_active(),
        }),
    ))
}
