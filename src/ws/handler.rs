use std::sync::Arc;
use std::time::Duration;
use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info};

use crate::AppState;
use crate::models::{decode_client_message, ServerMessage};
use super::connection::{ConnectionHandle, SEND_QUEUE_CAPACITY};
use super::dispatch::{Dispatcher, DispatchOutcome, JoinedSession};

/// WebSocket handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (handle, mut outbound) = ConnectionHandle::new(SEND_QUEUE_CAPACITY);
    info!("WebSocket connection established: {}", handle.id());

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Writer task drains the outbound queue into the socket, so broadcasts
    // from other connections never wait on this socket's readiness.
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let dispatcher = Dispatcher::new(app_state.sessions.clone(), app_state.store.clone());
    let mut joined: Option<JoinedSession> = None;

    // Process inbound frames one at a time: a connection's events are applied
    // in arrival order, and a persistence call in flight here never stalls
    // any other connection's loop.
    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(raw))) => {
                        match decode_client_message(&raw) {
                            Ok(msg) => {
                                let outcome = dispatcher.dispatch(&handle, &mut joined, msg).await;
                                if outcome == DispatchOutcome::Disconnect {
                                    break;
                                }
                            }
                            Err(e) => {
                                // Bad frames are answered, not fatal.
                                debug!("Undecodable frame on {}: {}", handle.id(), e);
                                let _ = handle.send(&ServerMessage::error(e.to_string()));
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary frames and ping/pong are ignored
                    Some(Err(_)) => break,
                }
            }
            _ = &mut send_task => break,
        }
    }

    // Notify peers and collect the session before the socket goes away.
    dispatcher.handle_disconnect(&handle, &mut joined);

    // Dropping the handle closes the outbound queue; the writer drains what
    // is still queued (e.g. the error reply to a denied join) and exits.
    let connection_id = handle.id();
    drop(handle);
    if !send_task.is_finished()
        && tokio::time::timeout(Duration::from_secs(5), &mut send_task)
            .await
            .is_err()
    {
        send_task.abort();
    }
    info!("WebSocket connection terminated: {}", connection_id);
}
