//! Comment channels: one live channel per post.
//!
//! DESIGN
//! ======
//! A websocket client joins the channel of a post, receives the post's
//! comment history, then gets every new comment as it is persisted,
//! including its own. Inbound text is HTML-escaped and queued to a single
//! comment worker, which persists and broadcasts in arrival order.
//!
//! The channel map only holds posts with at least one connected client. A
//! comment that reaches the worker after its channel emptied is dropped.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AppState, ChannelState, Channels};
use crate::store::{CommentRow, Store, StoreError};

const COMMENT_QUEUE_SIZE: usize = 1024;

/// An inbound comment waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub pid: i64,
    pub time: i64,
    /// Already HTML-escaped.
    pub text: String,
}

/// Escape `& < > " '` for safe embedding in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wire form of a comment: `{"cid","time","text"}`.
#[must_use]
pub fn encode_comment(row: &CommentRow) -> String {
    json!({ "cid": row.cid, "time": row.time, "text": row.text }).to_string()
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Register a client on the channel of `pid`, creating the channel if needed.
pub async fn join(channels: &Channels, pid: i64, client_id: Uuid, tx: mpsc::Sender<String>) {
    let mut channels = channels.write().await;
    let channel = channels.entry(pid).or_insert_with(ChannelState::new);
    channel.clients.insert(client_id, tx);
    info!(pid, %client_id, clients = channel.clients.len(), "client joined channel");
}

/// Remove a client; the channel itself goes away with its last client.
pub async fn part(channels: &Channels, pid: i64, client_id: Uuid) {
    let mut channels = channels.write().await;
    let Some(channel) = channels.get_mut(&pid) else {
        return;
    };

    channel.clients.remove(&client_id);
    info!(pid, %client_id, remaining = channel.clients.len(), "client left channel");

    if channel.clients.is_empty() {
        channels.remove(&pid);
        debug!(pid, "channel closed");
    }
}

/// Send `text` to every client of the channel. A client whose queue is full
/// misses the message.
pub async fn broadcast(channels: &Channels, pid: i64, text: &str) {
    let channels = channels.read().await;
    let Some(channel) = channels.get(&pid) else {
        return;
    };

    for (client_id, tx) in &channel.clients {
        if tx.try_send(text.to_owned()).is_err() {
            debug!(pid, %client_id, "client queue full or closed; message skipped");
        }
    }
}

/// Encoded comment history of a post, oldest first.
///
/// # Errors
///
/// Returns a store error if the comments cannot be read.
pub async fn history(state: &AppState, pid: i64) -> Result<Vec<String>, StoreError> {
    let rows = state.store.comments_for_post(pid).await?;
    Ok(rows.iter().map(encode_comment).collect())
}

// =============================================================================
// WORKER
// =============================================================================

/// Spawn the comment worker and return its queue.
#[must_use]
pub fn spawn_comment_worker(store: Arc<dyn Store>, channels: Channels) -> mpsc::Sender<Comment> {
    let (tx, mut rx) = mpsc::channel::<Comment>(COMMENT_QUEUE_SIZE);

    tokio::spawn(async move {
        while let Some(comment) = rx.recv().await {
            if !channels.read().await.contains_key(&comment.pid) {
                debug!(pid = comment.pid, "channel gone; comment dropped");
                continue;
            }

            match store.insert_comment(comment.pid, comment.time, &comment.text).await {
                Ok(cid) => {
                    let row = CommentRow { cid, pid: comment.pid, time: comment.time, text: comment.text };
                    broadcast(&channels, row.pid, &encode_comment(&row)).await;
                }
                Err(e) => warn!(pid = comment.pid, error = %e, "comment insert failed"),
            }
        }
    });

    tx
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
