//! File service: upload intake, throttled disk writer, and file lookup.
//!
//! DESIGN
//! ======
//! An accepted upload is recorded in the store right away and its bytes are
//! handed to a single writer task through a bounded queue. The writer keeps
//! at least `UploadConfig::interval` between two writes, so a burst of
//! uploads fills the queue and further uploads are refused with
//! `QueueFull` instead of piling up in memory.
//!
//! A queue slot is reserved before the file row is created, so a refused
//! upload never leaves a row without a file behind it.

use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::body::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use crate::config::UploadConfig;
use crate::services::now_unix;
use crate::state::AppState;
use crate::store::StoreError;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("missing file part")]
    MissingFile,
    #[error("file is not an image")]
    NotAnImage,
    #[error("file exceeds {max} bytes")]
    TooLarge { max: usize },
    #[error("upload queue is full")]
    QueueFull,
    #[error("upload writer stopped")]
    WriterStopped,
    #[error("invalid file name")]
    BadName,
    #[error("file not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An accepted upload waiting to be written to disk.
#[derive(Debug)]
pub struct PendingFile {
    pub fid: i64,
    pub ctype: String,
    pub bytes: Bytes,
}

// =============================================================================
// INTAKE
// =============================================================================

/// Extract the image subtype from a part's content type.
///
/// `image/png` yields `png`. Parameters are ignored and the subtype is
/// lowercased. Anything that is not `image/<alphanumeric>` yields `None`;
/// the subtype becomes the file extension on disk.
#[must_use]
pub fn image_subtype(content_type: Option<&str>) -> Option<String> {
    let essence = content_type?.split(';').next()?.trim();
    let subtype = essence
        .get(..6)
        .filter(|prefix| prefix.eq_ignore_ascii_case("image/"))
        .map(|_| &essence[6..])?;
    if subtype.is_empty() || !subtype.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(subtype.to_ascii_lowercase())
}

/// Validate an upload, record it, and queue its bytes for the writer.
/// Returns the new file id.
///
/// # Errors
///
/// `NotAnImage`, `TooLarge`, `QueueFull`, `WriterStopped`, or a store error.
pub async fn accept_upload(
    state: &AppState,
    name: &str,
    content_type: Option<&str>,
    bytes: Bytes,
) -> Result<i64, FileError> {
    let ctype = image_subtype(content_type).ok_or(FileError::NotAnImage)?;

    let max = state.config.upload.max_bytes;
    if bytes.len() > max {
        return Err(FileError::TooLarge { max });
    }

    let permit = state.uploads.try_reserve().map_err(|e| match e {
        TrySendError::Full(()) => FileError::QueueFull,
        TrySendError::Closed(()) => FileError::WriterStopped,
    })?;

    let fid = state.store.insert_file(&ctype, name, now_unix()).await?;
    info!(fid, %ctype, bytes = bytes.len(), "upload accepted");
    permit.send(PendingFile { fid, ctype, bytes });
    Ok(fid)
}

// =============================================================================
// WRITER
// =============================================================================

/// Spawn the disk writer and return its bounded queue.
#[must_use]
pub fn spawn_upload_writer(config: UploadConfig) -> mpsc::Sender<PendingFile> {
    let (tx, mut rx) = mpsc::channel::<PendingFile>(config.queue_size.max(1));
    info!(
        dir = %config.dir.display(),
        queue_size = config.queue_size,
        interval = ?config.interval,
        "upload writer configured"
    );

    tokio::spawn(async move {
        let mut last_write: Option<Instant> = None;
        while let Some(file) = rx.recv().await {
            if let Some(last) = last_write {
                let elapsed = last.elapsed();
                if elapsed < config.interval {
                    tokio::time::sleep(config.interval - elapsed).await;
                }
            }
            last_write = Some(Instant::now());
            write_file(&config.dir, &file).await;
        }
    });

    tx
}

fn stored_path(dir: &Path, fid: i64, ctype: &str) -> PathBuf {
    dir.join(format!("{fid}.{ctype}"))
}

async fn write_file(dir: &Path, file: &PendingFile) {
    let path = stored_path(dir, file.fid, &file.ctype);
    match tokio::fs::write(&path, &file.bytes).await {
        Ok(()) => info!(fid = file.fid, ctype = %file.ctype, "file written"),
        Err(e) => warn!(fid = file.fid, path = %path.display(), error = %e, "file write failed"),
    }
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Split a served file name `{fid}.{ctype}`. Only ASCII letters, digits and
/// dots are allowed.
#[must_use]
pub fn parse_file_name(name: &str) -> Option<(i64, &str)> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.') {
        return None;
    }
    let (fid, ext) = name.split_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some((fid.parse().ok()?, ext))
}

/// Read a stored file by its served name. Returns `(ctype, bytes)`.
///
/// # Errors
///
/// `BadName` for a malformed name; `NotFound` if the fid is unknown, the
/// extension differs from the stored type, or the writer has not written the
/// file yet.
pub async fn load_file(state: &AppState, name: &str) -> Result<(String, Vec<u8>), FileError> {
    let (fid, ext) = parse_file_name(name).ok_or(FileError::BadName)?;
    let row = state.store.find_file(fid).await?.ok_or(FileError::NotFound)?;
    if row.ctype != ext {
        return Err(FileError::NotFound);
    }

    let path = stored_path(&state.config.upload.dir, fid, &row.ctype);
    let bytes = tokio::fs::read(&path).await.map_err(|_| FileError::NotFound)?;
    Ok((row.ctype, bytes))
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
