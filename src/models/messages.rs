use serde::{Deserialize, Serialize};
use crate::models::{ColumnDelta, NewTable, TableDelta, TableRecord};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinMessage {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeaveMessage {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CursorMoveMessage {
    pub session_id: String,
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableMessage {
    pub session_id: String,
    pub user_id: String,
    pub table: NewTable,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableMessage {
    pub session_id: String,
    pub user_id: String,
    pub table_id: String,
    pub new_values: TableDelta,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTableMessage {
    pub session_id: String,
    pub user_id: String,
    pub table_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColumnMessage {
    pub session_id: String,
    pub user_id: String,
    pub column_id: String,
    pub new_values: ColumnDelta,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub session_id: String,
    pub user_id: String,
    pub message: String,
}

/// Every message a client can send, closed over the protocol's variants.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join(JoinMessage),
    #[serde(rename = "leave")]
    Leave(LeaveMessage),
    #[serde(rename = "cursorMove")]
    CursorMove(CursorMoveMessage),
    #[serde(rename = "createTable")]
    CreateTable(CreateTableMessage),
    #[serde(rename = "updateTable")]
    UpdateTable(UpdateTableMessage),
    #[serde(rename = "deleteTable")]
    DeleteTable(DeleteTableMessage),
    #[serde(rename = "updateColumn")]
    UpdateColumn(UpdateColumnMessage),
    #[serde(rename = "message")]
    Chat(ChatMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedMessage {
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftMessage {
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdateMessage {
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

/// A confirmed schema mutation, carrying the values the store persisted.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "changeType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SchemaChange {
    CreateTable { table: TableRecord },
    UpdateTable { table_id: String, new_values: TableDelta },
    DeleteTable { table_id: String },
    UpdateColumn { column_id: String, new_values: ColumnDelta },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatRelayMessage {
    pub user_id: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorMessage {
    pub message: String,
}

/// Every message the server can send to a participant.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "userJoined")]
    UserJoined(UserJoinedMessage),
    #[serde(rename = "userLeft")]
    UserLeft(UserLeftMessage),
    #[serde(rename = "cursorMove")]
    CursorMove(CursorUpdateMessage),
    #[serde(rename = "schemaChange")]
    SchemaChange(SchemaChange),
    #[serde(rename = "message")]
    Chat(ChatRelayMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage { message: message.into() })
    }
}

/// Why an inbound frame could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Invalid message type")]
    InvalidType,
}

/// Decode one inbound frame. Non-JSON input and JSON that is not one of the
/// known message variants are reported separately so the caller can answer
/// with the protocol's distinct error strings.
pub fn decode_client_message(raw: &str) -> Result<ClientMessage, DecodeError> {
    match serde_json::from_str::<ClientMessage>(raw) {
        Ok(msg) => Ok(msg),
        Err(_) => {
            if serde_json::from_str::<serde_json::Value>(raw).is_err() {
                Err(DecodeError::InvalidJson)
            } else {
                Err(DecodeError::InvalidType)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_variants() {
        let msg = decode_client_message(
            r#"{"type":"cursorMove","sessionId":"sch-1","userId":"u1","x":10.0,"y":20.0,"color":"#fff"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::CursorMove(c) => {
                assert_eq!(c.session_id, "sch-1");
                assert_eq!(c.user_id, "u1");
                assert_eq!(c.color, "#fff");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_non_json() {
        assert_eq!(
            decode_client_message("not json at all"),
            Err(DecodeError::InvalidJson)
        );
        assert_eq!(DecodeError::InvalidJson.to_string(), "Invalid JSON");
    }

    #[test]
    fn decode_rejects_unknown_type() {
        assert_eq!(
            decode_client_message(r#"{"type":"teleport","sessionId":"s","userId":"u"}"#),
            Err(DecodeError::InvalidType)
        );
        assert_eq!(DecodeError::InvalidType.to_string(), "Invalid message type");
    }

    #[test]
    fn cursor_broadcast_wire_shape() {
        let msg = ServerMessage::CursorMove(CursorUpdateMessage {
            user_id: "A".into(),
            x: 10.0,
            y: 20.0,
            color: "#fff".into(),
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type":"cursorMove","userId":"A","x":10.0,"y":20.0,"color":"#fff"})
        );
    }

    #[test]
    fn schema_change_wire_shape() {
        let msg = ServerMessage::SchemaChange(SchemaChange::UpdateTable {
            table_id: "t1".into(),
            new_values: TableDelta {
                name: Some("Users".into()),
                ..Default::default()
            },
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "schemaChange",
                "changeType": "updateTable",
                "tableId": "t1",
                "newValues": {"name": "Users"}
            })
        );
    }

    #[test]
    fn error_wire_shape() {
        let json = serde_json::to_value(ServerMessage::error("Invalid JSON")).unwrap();
        assert_eq!(json, serde_json::json!({"type":"error","message":"Invalid JSON"}));
    }
}
