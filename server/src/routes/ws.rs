//! WebSocket handler for post comment channels.
//!
//! LIFECYCLE
//! =========
//! 1. Validate the pid and check the post exists, then upgrade
//! 2. Join the post's channel and send the stored comments, oldest first
//! 3. `select!` loop: inbound text → comment worker; channel messages → socket
//! 4. Close → leave the channel

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::services::channel::{self, Comment};
use crate::services::now_unix;
use crate::state::AppState;

/// Outbound queue depth per connection.
const CLIENT_QUEUE_SIZE: usize = 256;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, Path(pid): Path<String>, ws: WebSocketUpgrade) -> Response {
    let Some(pid) = pid.parse::<i64>().ok().filter(|pid| *pid >= 0) else {
        return (StatusCode::BAD_REQUEST, "Invalid pid.").into_response();
    };

    match state.store.find_post(pid).await {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "post not found").into_response(),
        Err(e) => {
            error!(pid, error = %e, "ws post lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    ws.on_upgrade(move |socket| run_ws(socket, state, pid))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, pid: i64) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<String>(CLIENT_QUEUE_SIZE);

    // Join before reading history: a comment persisted in between may arrive
    // twice but is never missed.
    channel::join(&state.channels, pid, client_id, client_tx).await;

    match channel::history(&state, pid).await {
        Ok(history) => {
            for text in history {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    channel::part(&state.channels, pid, client_id).await;
                    return;
                }
            }
        }
        Err(e) => warn!(pid, error = %e, "ws: comment history unavailable"),
    }

    info!(%client_id, pid, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let comment = Comment { pid, time: now_unix(), text: channel::escape_html(text.as_str()) };
                        if state.comments.try_send(comment).is_err() {
                            warn!(%client_id, pid, "ws: comment queue full; comment dropped");
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(text) = client_rx.recv() => {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    channel::part(&state.channels, pid, client_id).await;
    info!(%client_id, pid, "ws: client disconnected");
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
