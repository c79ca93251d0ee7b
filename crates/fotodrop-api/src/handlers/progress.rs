//! Live progress feed over WebSocket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;

use fotodrop_core::UserId;
use fotodrop_infra::CONNECTION_BUFFER;

use crate::state::AppState;

use super::UserQuery;

/// Upgrades to a WebSocket carrying progress frames for the given user.
/// One live connection per user: a reconnect supersedes the previous
/// socket, which is closed.
pub async fn progress_ws(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = UserId::from_uuid(query.user_id);
    ws.on_upgrade(move |socket| forward_frames(state, user_id, socket))
}

async fn forward_frames(state: Arc<AppState>, user_id: UserId, mut socket: WebSocket) {
    let (tx, mut rx) = mpsc::channel(CONNECTION_BUFFER);
    let connection_id = state.broadcaster.register(user_id, tx);
    tracing::debug!(user_id = %user_id, "progress connection opened");

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(frame) => {
                    let payload = match serde_json::to_string(&frame) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::error!(error = %err, "could not serialize progress frame");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                // Channel closed: this connection was superseded.
                None => break,
            },
            incoming = socket.recv() => match incoming {
                // Inbound messages (pings, stray text) are ignored.
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }

    state.broadcaster.unregister(user_id, connection_id);
    tracing::debug!(user_id = %user_id, "progress connection closed");
}
