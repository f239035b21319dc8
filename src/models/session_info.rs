use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Live state of one collaboration session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    pub schema_id: String,
    pub participants: Vec<String>,
    pub last_active: DateTime<Utc>,
}
