//! Server configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_UPLOAD_MAX_BYTES: usize = 2 << 20;
const DEFAULT_UPLOAD_QUEUE_SIZE: usize = 10;
const DEFAULT_UPLOAD_INTERVAL_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("UPLOAD_DIR must be set to the directory where uploaded files are stored")]
    MissingUploadDir,
}

/// Upload intake and writer tuning.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded files are written to as `{fid}.{ctype}`.
    pub dir: PathBuf,
    pub max_bytes: usize,
    /// Pending writes allowed before new uploads are refused.
    pub queue_size: usize,
    /// Minimum time between two file writes.
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub upload: UploadConfig,
    /// Optional static test page served as the router fallback.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingUploadDir` if `UPLOAD_DIR` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingUploadDir` if `UPLOAD_DIR` is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let dir = non_empty("UPLOAD_DIR")
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingUploadDir)?;

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            upload: UploadConfig {
                dir,
                max_bytes: parse_or(&lookup, "UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES),
                queue_size: parse_or(&lookup, "UPLOAD_QUEUE_SIZE", DEFAULT_UPLOAD_QUEUE_SIZE),
                interval: Duration::from_millis(parse_or(&lookup, "UPLOAD_INTERVAL_MS", DEFAULT_UPLOAD_INTERVAL_MS)),
            },
            static_dir: non_empty("STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
