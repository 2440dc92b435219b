use crate::state::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

/// Upgrade any request on the relay port.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let peer = state.relay.connect(tx).await;

    // Forward queued frames to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Frames from one socket are handled in order
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.relay.on_message(peer, text.to_string()).await;
            }
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(text) => state.relay.on_message(peer, text).await,
                Err(_) => tracing::debug!(peer = %peer, "Ignoring non-UTF-8 binary frame"),
            },
            // Pongs are written by the socket itself
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(peer = %peer, "WebSocket error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    state.relay.disconnect(peer).await;
}
