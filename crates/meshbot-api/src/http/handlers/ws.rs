//! WebSocket feed of bot lifecycle events and mesh traffic.
//!
//! `GET /api/v1/events` upgrades to a WebSocket and pushes every
//! [`MeshEvent`](meshbot_types::event::MeshEvent) as a JSON text frame.
//! Clients may send `{"type":"ping"}`; the server answers `{"type":"pong"}`.
//! A client that falls behind skips the events it missed.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    Ping,
}

/// GET /api/v1/events
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut event_rx = state.supervisor.events().subscribe();

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "failed to serialize event"),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<WsCommand>(&text) {
                        Ok(WsCommand::Ping) => {
                            let pong = r#"{"type":"pong"}"#;
                            if ws_sender.send(Message::Text(pong.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::debug!(raw = %text.as_str(), error = %err, "ignoring websocket message");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "websocket receive error");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("websocket connection closed");
}
