//! Domain services used by the HTTP and websocket routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation, persistence and queueing so route handlers
//! can stay focused on protocol translation and status codes.

pub mod channel;
pub mod files;
pub mod posts;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds; 0 if the clock is before the epoch.
pub(crate) fn now_unix() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_secs()).unwrap_or(0)
}
