//! Post service: create, read one, list by topic.
//!
//! Topics are short tags of 1-4 lowercase letters or digits; post text is
//! 1-2000 bytes. Every post references an uploaded file, exposed on read as
//! the file's served path.

use serde::Serialize;
use tracing::info;

use crate::services::now_unix;
use crate::state::AppState;
use crate::store::{PostRow, StoreError};

pub const MAX_TOPIC_LEN: usize = 4;
pub const MAX_TEXT_BYTES: usize = 2000;
pub const FILES_PREFIX: &str = "/api/f/";

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Invalid fid.")]
    InvalidFid,
    #[error("Unknown fid.")]
    UnknownFid,
    #[error("Invalid topic.")]
    InvalidTopic,
    #[error("Invalid text.")]
    InvalidText,
    #[error("Invalid pid.")]
    InvalidPid,
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A post as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub pid: i64,
    /// Served path of the post's image.
    pub file: String,
    pub topic: String,
    pub text: String,
    pub time: i64,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            pid: row.pid,
            file: format!("{FILES_PREFIX}{}.{}", row.fid, row.ctype),
            topic: row.topic,
            text: row.text,
            time: row.time,
        }
    }
}

/// Whether every character of `topic` is a lowercase ASCII letter or digit.
/// The empty string passes; callers enforce their own length bounds.
#[must_use]
pub fn valid_topic(topic: &str) -> bool {
    topic.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Validate the raw form fields and create a post. Returns the new post id.
///
/// # Errors
///
/// Field validation errors in form order (`fid`, then `topic`, then
/// `text`), or a store error.
pub async fn create_post(state: &AppState, fid: &str, topic: &str, text: &str) -> Result<i64, PostError> {
    let fid = fid
        .parse::<i64>()
        .ok()
        .filter(|fid| *fid >= 1)
        .ok_or(PostError::InvalidFid)?;
    if state.store.find_file(fid).await?.is_none() {
        return Err(PostError::UnknownFid);
    }

    if topic.is_empty() || topic.len() > MAX_TOPIC_LEN || !valid_topic(topic) {
        return Err(PostError::InvalidTopic);
    }
    if text.is_empty() || text.len() > MAX_TEXT_BYTES {
        return Err(PostError::InvalidText);
    }

    let pid = match state.store.insert_post(fid, topic, text, now_unix()).await {
        Ok(pid) => pid,
        Err(StoreError::UnknownFile(_)) => return Err(PostError::UnknownFid),
        Err(e) => return Err(e.into()),
    };
    info!(pid, fid, %topic, "post created");
    Ok(pid)
}

/// Look up one post by its raw path segment.
///
/// # Errors
///
/// `InvalidPid` unless the segment is an integer >= 1; `NotFound` if no post
/// has that id.
pub async fn get_post(state: &AppState, pid: &str) -> Result<Post, PostError> {
    let pid = pid
        .parse::<i64>()
        .ok()
        .filter(|pid| *pid >= 1)
        .ok_or(PostError::InvalidPid)?;
    let row = state.store.find_post(pid).await?.ok_or(PostError::NotFound)?;
    Ok(row.into())
}

/// All posts under `topic`, oldest first.
///
/// # Errors
///
/// `InvalidTopic` if the topic is too long or has characters outside
/// `[a-z0-9]`.
pub async fn list_topic(state: &AppState, topic: &str) -> Result<Vec<Post>, PostError> {
    if topic.len() > MAX_TOPIC_LEN || !valid_topic(topic) {
        return Err(PostError::InvalidTopic);
    }
    let rows = state.store.posts_by_topic(topic).await?;
    Ok(rows.into_iter().map(Post::from).collect())
}

#[cfg(test)]
#[path = "posts_test.rs"]
mod tests;
