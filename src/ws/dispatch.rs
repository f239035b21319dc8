use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{
    ChatMessage, ChatRelayMessage, ClientMessage, CreateTableMessage, CursorMoveMessage,
    CursorUpdateMessage, DeleteTableMessage, JoinMessage, SchemaChange, ServerMessage,
    UpdateColumnMessage, UpdateTableMessage, UserJoinedMessage, UserLeftMessage,
};
use crate::services::schema_store::SchemaStore;
use super::broadcast::broadcast_to_others;
use super::connection::ConnectionHandle;
use super::session::CollabSession;
use super::store::SessionStore;

/// What the connection loop should do after an event was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    /// The connection must be terminated (failed join authorization).
    Disconnect,
}

/// The session a connection is currently a participant of.
pub struct JoinedSession {
    session: Arc<CollabSession>,
    schema_id: String,
    user_id: String,
}

/// Processes inbound events for one connection: authorizes joins, applies
/// schema mutations through the store, and fans confirmed results out to the
/// other participants. Events are handled one at a time per connection, so
/// a connection's events take effect in arrival order; there is no ordering
/// across connections.
pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    store: Arc<dyn SchemaStore>,
}

impl Dispatcher {
    pub fn new(sessions: Arc<SessionStore>, store: Arc<dyn SchemaStore>) -> Self {
        Self { sessions, store }
    }

    pub async fn dispatch(
        &self,
        handle: &ConnectionHandle,
        joined: &mut Option<JoinedSession>,
        msg: ClientMessage,
    ) -> DispatchOutcome {
        match msg {
            ClientMessage::Join(m) => self.handle_join(handle, joined, m).await,
            ClientMessage::Leave(_) => {
                match joined.take() {
                    Some(prev) => self.leave_session(handle, prev),
                    None => self.reject(handle, "Not in a session"),
                }
                DispatchOutcome::Continue
            }
            ClientMessage::CursorMove(m) => {
                self.handle_cursor_move(handle, joined, m);
                DispatchOutcome::Continue
            }
            ClientMessage::CreateTable(m) => {
                self.handle_create_table(handle, joined, m).await;
                DispatchOutcome::Continue
            }
            ClientMessage::UpdateTable(m) => {
                self.handle_update_table(handle, joined, m).await;
                DispatchOutcome::Continue
            }
            ClientMessage::DeleteTable(m) => {
                self.handle_delete_table(handle, joined, m).await;
                DispatchOutcome::Continue
            }
            ClientMessage::UpdateColumn(m) => {
                self.handle_update_column(handle, joined, m).await;
                DispatchOutcome::Continue
            }
            ClientMessage::Chat(m) => {
                self.handle_chat(handle, joined, m);
                DispatchOutcome::Continue
            }
        }
    }

    /// The connection dropped without a leave event; run the same path so
    /// peers hear about it promptly and empty sessions get collected.
    pub fn handle_disconnect(&self, handle: &ConnectionHandle, joined: &mut Option<JoinedSession>) {
        if let Some(prev) = joined.take() {
            self.leave_session(handle, prev);
        }
    }

    async fn handle_join(
        &self,
        handle: &ConnectionHandle,
        joined: &mut Option<JoinedSession>,
        msg: JoinMessage,
    ) -> DispatchOutcome {
        // Fail closed: a lookup error or a missing schema both deny.
        let allowed = match self
            .store
            .is_schema_member(&msg.user_id, &msg.session_id)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(
                    "Membership lookup for user '{}' on schema '{}' failed: {}",
                    msg.user_id, msg.session_id, e
                );
                false
            }
        };

        if !allowed {
            info!(
                "Denied join for user '{}' on schema '{}'",
                msg.user_id, msg.session_id
            );
            self.reject(handle, "Unauthorized");
            return DispatchOutcome::Disconnect;
        }

        // A connection can only be in one session; switching schemas leaves
        // the old one first. Rejoining the same session just replaces the
        // registered handle.
        if let Some(prev) = joined.take() {
            if prev.schema_id != msg.session_id || prev.user_id != msg.user_id {
                self.leave_session(handle, prev);
            }
        }

        let session = self
            .sessions
            .join(&msg.session_id, &msg.user_id, handle.clone());
        info!(
            "User '{}' joined session '{}' ({} participants)",
            msg.user_id,
            msg.session_id,
            session.participant_count()
        );

        broadcast_to_others(
            &session,
            &msg.user_id,
            &ServerMessage::UserJoined(UserJoinedMessage {
                user_id: msg.user_id.clone(),
            }),
        );

        *joined = Some(JoinedSession {
            session,
            schema_id: msg.session_id,
            user_id: msg.user_id,
        });
        DispatchOutcome::Continue
    }

    fn leave_session(&self, handle: &ConnectionHandle, prev: JoinedSession) {
        // Guarded by the connection id: if the user already rejoined from a
        // newer connection, this one's departure must not remove them.
        let removed = prev.session.remove_participant(&prev.user_id, handle.id());
        if !removed {
            return;
        }

        info!(
            "User '{}' left session '{}'",
            prev.user_id, prev.schema_id
        );
        broadcast_to_others(
            &prev.session,
            &prev.user_id,
            &ServerMessage::UserLeft(UserLeftMessage {
                user_id: prev.user_id.clone(),
            }),
        );
        self.sessions.remove_if_empty(&prev.schema_id);
    }

    fn handle_cursor_move(
        &self,
        handle: &ConnectionHandle,
        joined: &Option<JoinedSession>,
        msg: CursorMoveMessage,
    ) {
        // Membership was established at join; cursor traffic is relay-only.
        let Some(ctx) = self.require_joined(handle, joined) else {
            return;
        };
        ctx.session.touch();
        broadcast_to_others(
            &ctx.session,
            &ctx.user_id,
            &ServerMessage::CursorMove(CursorUpdateMessage {
                user_id: ctx.user_id.clone(),
                x: msg.x,
                y: msg.y,
                color: msg.color,
            }),
        );
    }

    async fn handle_create_table(
        &self,
        handle: &ConnectionHandle,
        joined: &Option<JoinedSession>,
        msg: CreateTableMessage,
    ) {
        let Some(ctx) = self.require_joined(handle, joined) else {
            return;
        };
        ctx.session.touch();

        match self.store.create_table(&ctx.schema_id, &msg.table).await {
            Ok(record) => {
                // Relay what was persisted, not what was submitted.
                broadcast_to_others(
                    &ctx.session,
                    &ctx.user_id,
                    &ServerMessage::SchemaChange(SchemaChange::CreateTable { table: record }),
                );
            }
            Err(e) => self.reject(handle, &e.to_string()),
        }
    }

    async fn handle_update_table(
        &self,
        handle: &ConnectionHandle,
        joined: &Option<JoinedSession>,
        msg: UpdateTableMessage,
    ) {
        let Some(ctx) = self.require_joined(handle, joined) else {
            return;
        };
        ctx.session.touch();

        if msg.new_values.is_empty() {
            self.reject(handle, "At least one field to update is required");
            return;
        }

        match self.store.update_table(&msg.table_id, &msg.new_values).await {
            Ok(record) => {
                let confirmed = msg.new_values.confirmed_by(&record);
                broadcast_to_others(
                    &ctx.session,
                    &ctx.user_id,
                    &ServerMessage::SchemaChange(SchemaChange::UpdateTable {
                        table_id: msg.table_id,
                        new_values: confirmed,
                    }),
                );
            }
            Err(e) => self.reject(handle, &e.to_string()),
        }
    }

    async fn handle_delete_table(
        &self,
        handle: &ConnectionHandle,
        joined: &Option<JoinedSession>,
        msg: DeleteTableMessage,
    ) {
        let Some(ctx) = self.require_joined(handle, joined) else {
            return;
        };
        ctx.session.touch();

        match self.store.delete_table(&msg.table_id).await {
            Ok(()) => {
                broadcast_to_others(
                    &ctx.session,
                    &ctx.user_id,
                    &ServerMessage::SchemaChange(SchemaChange::DeleteTable {
                        table_id: msg.table_id,
                    }),
                );
            }
            Err(e) => self.reject(handle, &e.to_string()),
        }
    }

    async fn handle_update_column(
        &self,
        handle: &ConnectionHandle,
        joined: &Option<JoinedSession>,
        msg: UpdateColumnMessage,
    ) {
        let Some(ctx) = self.require_joined(handle, joined) else {
            return;
        };
        ctx.session.touch();

        if msg.new_values.is_empty() {
            self.reject(handle, "At least one field to update is required");
            return;
        }

        match self
            .store
            .update_column(&msg.column_id, &msg.new_values)
            .await
        {
            Ok(record) => {
                let confirmed = msg.new_values.confirmed_by(&record);
                broadcast_to_others(
                    &ctx.session,
                    &ctx.user_id,
                    &ServerMessage::SchemaChange(SchemaChange::UpdateColumn {
                        column_id: msg.column_id,
                        new_values: confirmed,
                    }),
                );
            }
            Err(e) => self.reject(handle, &e.to_string()),
        }
    }

    fn handle_chat(
        &self,
        handle: &ConnectionHandle,
        joined: &Option<JoinedSession>,
        msg: ChatMessage,
    ) {
        let Some(ctx) = self.require_joined(handle, joined) else {
            return;
        };
        ctx.session.touch();
        broadcast_to_others(
            &ctx.session,
            &ctx.user_id,
            &ServerMessage::Chat(ChatRelayMessage {
                user_id: ctx.user_id.clone(),
                message: msg.message,
            }),
        );
    }

    fn require_joined<'a>(
        &self,
        handle: &ConnectionHandle,
        joined: &'a Option<JoinedSession>,
    ) -> Option<&'a JoinedSession> {
        match joined {
            Some(ctx) => Some(ctx),
            None => {
                self.reject(handle, "Not in a session");
                None
            }
        }
    }

    // Errors go to the originator only, never into the session.
    fn reject(&self, handle: &ConnectionHandle, message: &str) {
        let _ = handle.send(&ServerMessage::error(message));
    }
}
