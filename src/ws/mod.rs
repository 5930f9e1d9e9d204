pub mod admin;
pub mod handlers;
pub mod participant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::app::AppState;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

impl WsQuery {
    pub fn role(&self) -> Role {
        match self.role.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::Participant,
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request: role={:?}", params.role);

    ws.on_upgrade(move |socket| handle_socket(socket, params.role(), state))
}

/// Serialize and send one message. Returns false once the socket is unusable.
async fn send_message(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before registering so no snapshot after the welcome is missed
    let mut broadcast_rx = state.session.subscribe(&role);
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();

    let connected = match state.session.connect(role.clone(), outbox_tx).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Could not register connection: {}", e);
            let _ = send_message(&mut sender, &e.into()).await;
            return;
        }
    };
    let conn = connected.connection_id;

    if !send_message(&mut sender, &connected.welcome).await {
        tracing::error!("Failed to send welcome message");
        state.session.disconnect(conn).await;
        return;
    }

    tracing::info!("WebSocket {} connected with role: {:?}", conn, role);

    loop {
        tokio::select! {
            // Full snapshots for everyone with this role
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if !send_message(&mut sender, &msg).await {
                            break;
                        }
                    }
                    // Every update is a full snapshot, so skipping is safe
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Connection {} skipped {} snapshots", conn, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // Messages addressed to this connection only
            direct_msg = outbox_rx.recv() => {
                match direct_msg {
                    Some(msg) => {
                        if !send_message(&mut sender, &msg).await {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message on {}: {}", conn, text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                match state.session.dispatch(conn.clone(), role.clone(), client_msg).await {
                                    Ok(reply) => reply,
                                    Err(e) => Some(e.into()),
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                })
                            }
                        };

                        if let Some(response) = response {
                            if !send_message(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket {} closed", conn);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.session.disconnect(conn.clone()).await;
    tracing::info!("WebSocket connection {} closed for role: {:?}", conn, role);
}
