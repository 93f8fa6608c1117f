//! Client endpoint configuration.

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Where the server lives. HTTP and websocket URLs are both derived from
/// `base_url`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Join an absolute API path onto the base URL.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Websocket URL for an API path, swapping the scheme to `ws`/`wss`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the base URL is not `http://`
    /// or `https://`.
    pub fn ws_url(&self, path: &str) -> Result<String, ConfigError> {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if let Some(rest) = base.strip_prefix("http://") {
            return Ok(format!("ws://{rest}/{path}"));
        }
        if let Some(rest) = base.strip_prefix("https://") {
            return Ok(format!("wss://{rest}/{path}"));
        }

        Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }

    /// Websocket URL of the comment channel for one post.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::ws_url`].
    pub fn channel_url(&self, pid: i64) -> Result<String, ConfigError> {
        self.ws_url(&format!("/api/ws/{pid}"))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
