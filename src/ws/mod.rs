use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::IntoResponse,
};
use futures::stream::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::connection::{Connection, WsConnection};
use crate::registry::ConnectionRef;
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request from {}", addr);

    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Handle one WebSocket connection from registration to removal.
///
/// Inbound frames are handled one at a time, so replies go out in the order
/// the messages arrived.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let conn = Arc::new(WsConnection::new(addr, sender));
    let handle: ConnectionRef = conn.clone();
    let id = conn.id().to_string();

    if let Err(e) = state.registry.add(handle.clone()).await {
        tracing::error!("Refusing connection: {}", e);
        if let Err(e) = conn.close().await {
            tracing::debug!("Closing refused client {} failed: {}", id, e);
        }
        return;
    }

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                state.dispatcher.handle(&id, text.as_str()).await;
            }
            Ok(Message::Binary(data)) => {
                state.dispatcher.handle_bytes(&id, &data).await;
            }
            Ok(Message::Ping(data)) => {
                if conn.pong(data).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("WebSocket closed by {}", id);
                break;
            }
            Ok(Message::Pong(_)) => {}
            Err(e) => {
                tracing::error!("WebSocket error from {}: {}", id, e);
                break;
            }
        }

        // A failed reply evicts the connection; stop reading from it
        if !state.registry.is_registered(&handle).await {
            break;
        }
    }

    state.registry.evict(&handle).await;
    tracing::info!("WebSocket connection closed for {}", id);
}
