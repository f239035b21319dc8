use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::ServerMessage;

/// Outbound frames buffered per connection before the writer task drains
/// them to the socket.
pub const SEND_QUEUE_CAPACITY: usize = 64;

/// Why a delivery attempt did not reach the connection's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("send queue full")]
    Full,
}

/// Handle to one live participant connection.
///
/// The handle only knows how to enqueue a frame; the owning socket task
/// forwards queued frames to the transport. Delivery is non-blocking: a
/// closed or saturated connection reports an error and is simply skipped
/// by callers.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    tx: mpsc::Sender<String>,
}

impl ConnectionHandle {
    /// Create a handle plus the receiver the socket writer task drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    /// Identity of the underlying connection, used to guard removal so a
    /// stale connection can never evict its replacement.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueue an already-serialized frame.
    pub fn send_raw(&self, payload: String) -> Result<(), SendError> {
        match self.tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(SendError::Full),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::Closed),
        }
    }

    /// Serialize and enqueue one server message.
    pub fn send(&self, msg: &ServerMessage) -> Result<(), SendError> {
        match serde_json::to_string(msg) {
            Ok(payload) => self.send_raw(payload),
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_reaches_receiver() {
        let (handle, mut rx) = ConnectionHandle::new(8);
        handle.send(&ServerMessage::error("boom")).unwrap();

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload, r#"{"type":"error","message":"boom"}"#);
    }

    #[tokio::test]
    async fn send_to_dropped_receiver_is_closed() {
        let (handle, rx) = ConnectionHandle::new(8);
        drop(rx);
        assert_eq!(handle.send_raw("x".into()), Err(SendError::Closed));
    }

    #[tokio::test]
    async fn full_queue_reports_full() {
        let (handle, _rx) = ConnectionHandle::new(1);
        assert!(handle.send_raw("first".into()).is_ok());
        assert_eq!(handle.send_raw("second".into()), Err(SendError::Full));
    }

    #[test]
    fn handles_have_distinct_ids() {
        let (a, _ra) = ConnectionHandle::new(1);
        let (b, _rb) = ConnectionHandle::new(1);
        assert_ne!(a.id(), b.id());
    }
}
