use tracing::{debug, error};

use crate::models::ServerMessage;
use super::connection::ConnectionHandle;
use super::session::CollabSession;

/// Fan an event out to every participant except the originator.
///
/// Delivery is best-effort: a handle whose connection is closed or whose
/// queue is full is skipped, never retried, and never stops delivery to the
/// remaining participants. Returns how many queues accepted the frame.
pub fn broadcast_to_others(
    session: &CollabSession,
    exclude_user_id: &str,
    msg: &ServerMessage,
) -> usize {
    let payload = match serde_json::to_string(msg) {
        Ok(payload) => payload,
        Err(e) => {
            error!(
                "Failed to serialize broadcast for schema '{}': {}",
                session.schema_id(),
                e
            );
            return 0;
        }
    };

    let mut delivered = 0;
    for (user_id, handle) in session.other_participants(exclude_user_id) {
        match handle.send_raw(payload.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                debug!(
                    "Skipping participant '{}' in schema '{}': {}",
                    user_id,
                    session.schema_id(),
                    e
                );
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CursorUpdateMessage, ServerMessage};

    fn cursor_msg() -> ServerMessage {
        ServerMessage::CursorMove(CursorUpdateMessage {
            user_id: "A".into(),
            x: 10.0,
            y: 20.0,
            color: "#fff".into(),
        })
    }

    #[tokio::test]
    async fn delivers_to_others_but_not_originator() {
        let session = CollabSession::new("sch-1");
        let (ha, mut rx_a) = ConnectionHandle::new(8);
        let (hb, mut rx_b) = ConnectionHandle::new(8);
        session.add_participant("A", ha);
        session.add_participant("B", hb);

        let delivered = broadcast_to_others(&session, "A", &cursor_msg());

        assert_eq!(delivered, 1);
        let frame = rx_b.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "cursorMove");
        assert_eq!(value["userId"], "A");
        assert_eq!(value["x"], 10.0);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_handle_does_not_abort_delivery() {
        let session = CollabSession::new("sch-1");
        let (dead, dead_rx) = ConnectionHandle::new(8);
        drop(dead_rx);
        let (alive, mut alive_rx) = ConnectionHandle::new(8);
        session.add_participant("B", dead);
        session.add_participant("C", alive);

        let delivered = broadcast_to_others(&session, "A", &cursor_msg());

        assert_eq!(delivered, 1);
        assert!(alive_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn saturated_handle_is_skipped() {
        let session = CollabSession::new("sch-1");
        let (full, _full_rx) = ConnectionHandle::new(1);
        full.send_raw("occupied".into()).unwrap();
        session.add_participant("B", full);

        assert_eq!(broadcast_to_others(&session, "A", &cursor_msg()), 0);
    }
}
