//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the store, the upload queue feeding the file writer, the comment
//! queue feeding the comment worker, and the live comment channels keyed by
//! post id. Building it spawns both workers, so it must be created inside a
//! tokio runtime.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::services::channel::{self, Comment};
use crate::services::files::{self, PendingFile};
use crate::store::Store;

// =============================================================================
// CHANNEL STATE
// =============================================================================

/// Live connections of one post's comment channel.
pub struct ChannelState {
    /// Connected clients: `client_id` -> sender for outgoing text frames.
    pub clients: HashMap<Uuid, mpsc::Sender<String>>,
}

impl ChannelState {
    #[must_use]
    pub fn new() -> Self {
        Self { clients: HashMap::new() }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

pub type Channels = Arc<RwLock<HashMap<i64, ChannelState>>>;

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; every field is
/// Arc-wrapped or a channel handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    /// Bounded queue of accepted uploads waiting to be written to disk.
    pub uploads: mpsc::Sender<PendingFile>,
    /// Queue of inbound comments waiting to be persisted and broadcast.
    pub comments: mpsc::Sender<Comment>,
    pub channels: Channels,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let channels: Channels = Arc::new(RwLock::new(HashMap::new()));
        let uploads = files::spawn_upload_writer(config.upload.clone());
        let comments = channel::spawn_comment_worker(store.clone(), channels.clone());
        Self { store, config: Arc::new(config), uploads, comments, channels }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_state_new_is_empty() {
        assert!(ChannelState::new().clients.is_empty());
        assert!(ChannelState::default().clients.is_empty());
    }

    #[tokio::test]
    async fn app_state_starts_without_channels() {
        let state = test_helpers::test_app_state().await;
        assert!(state.channels.read().await.is_empty());
        assert_eq!(state.uploads.capacity(), 4);
    }
}
