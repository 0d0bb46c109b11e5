//! Axum WebSocket handler
//!
//! One connection runs one receive loop and one sender task. The loop owns
//! the [`VoiceSession`] and `select!`s over socket frames and transcript
//! events; everything written to the socket goes through the sender task.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::state::AppState;

use super::messages::{IncomingMessage, MessageRoute};
use super::session::VoiceSession;

/// Outbound queue depth per connection
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How long queued events may take to flush once the loop has ended
const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Voice relay WebSocket handler
///
/// Upgrades `GET /ws` and runs a voice session until the client goes away.
pub async fn ws_voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("WebSocket voice connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_voice_socket(socket, state))
}

async fn handle_voice_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "WebSocket voice connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    let mut sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                MessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MessageRoute::Close => {
                    // The peer may already have closed its side.
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let mut session = VoiceSession::new(&app_state, message_tx.clone());

    loop {
        select! {
            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(msg)) => {
                        if !process_message(msg, &mut session).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(%connection_id, "WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!(%connection_id, "WebSocket connection closed by client");
                        break;
                    }
                }
            }
            Some(event) = session.next_transcript() => {
                session.forward_transcript(event).await;
            }
        }
    }

    // Tears down any recognizer still open.
    drop(session);

    let _ = message_tx.send(MessageRoute::Close).await;
    drop(message_tx);
    if timeout(SENDER_DRAIN_TIMEOUT, &mut sender_task).await.is_err() {
        debug!(%connection_id, "Sender task did not drain in time, aborting");
        sender_task.abort();
    }

    info!(%connection_id, "WebSocket voice connection terminated");
}

/// Handle one inbound frame. Returns `false` when the connection should end.
async fn process_message(msg: Message, session: &mut VoiceSession) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());
            match IncomingMessage::parse(&text) {
                Ok(message) => session.handle_message(message).await,
                Err(e) => {
                    warn!("Rejected client message: {}", e);
                    session.send_error(&e).await;
                }
            }
            true
        }
        Message::Binary(data) => {
            session
                .handle_message(IncomingMessage::AudioChunk(data))
                .await;
            true
        }
        Message::Ping(_) => {
            debug!("Received ping");
            true
        }
        Message::Pong(_) => {
            debug!("Received pong");
            true
        }
        Message::Close(_) => {
            info!("WebSocket close received");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ws::messages::OutgoingMessage;

    #[test]
    fn test_error_event_serialization() {
        let err = IncomingMessage::parse(r#"{"type":"hello"}"#).unwrap_err();
        let json = serde_json::to_string(&OutgoingMessage::error(&err)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"error","payload":"Unknown message type: hello"}"#
        );
    }
}
