//! Upload-and-post submission.
//!
//! DESIGN
//! ======
//! A submission is a strictly sequential two-step pipeline:
//! 1. `POST /api/file` with the image → plain-text file id
//! 2. `POST /api/post` with `fid`, `topic`, `text` → JSON post id
//!
//! then a navigation to `/api/p/{pid}`. The second request is only issued
//! after the first resolved with a success status.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures and non-success statuses are terminal and surface as a
//! fixed sentence on the status line (`SubmitError`'s `Display`). Nothing is
//! retried or rolled back: an uploaded file stays stored when post creation
//! fails. Overlapping submissions are not guarded against; each runs its own
//! pair of requests and the last status write wins.

use std::fmt;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::page::{FileUpload, Navigator, PostForm, StatusLine};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Failed to upload file.")]
    UploadFailed(#[source] reqwest::Error),
    #[error("File response not OK.")]
    UploadRejected { status: StatusCode },
    #[error("Failed to create post.")]
    PostFailed(#[source] reqwest::Error),
    #[error("Post response not OK.")]
    PostRejected { status: StatusCode },
    #[error("response body could not be read: {0}")]
    UnreadableBody(#[source] reqwest::Error),
    #[error("post response is not JSON: {0}")]
    InvalidPostId(#[source] serde_json::Error),
}

impl SubmitError {
    /// Whether this error is reported on the status line. Failures after a
    /// success status (body read, post id decode) leave the status line as
    /// it was.
    #[must_use]
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::UnreadableBody(_) | Self::InvalidPostId(_))
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// File id parsed from the upload response.
///
/// Parsing is lenient: the longest leading base-10 integer wins, and text
/// with no digits yields `NaN`, which is still carried into the post request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileId {
    Int(i64),
    NaN,
}

impl FileId {
    /// Parse the upload response body.
    ///
    /// Leading whitespace is skipped, an optional sign is accepted, and
    /// parsing stops at the first non-digit. Values that do not fit in an
    /// `i64` are `NaN`.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let trimmed = body.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Self::NaN;
        }

        let digits = &rest[..digits_len];
        let signed = if negative { format!("-{digits}") } else { digits.to_owned() };
        signed.parse::<i64>().map_or(Self::NaN, Self::Int)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::NaN => f.write_str("NaN"),
        }
    }
}

/// Post id decoded from the post-creation response. Any JSON value is
/// accepted and interpolated into the post path.
#[derive(Debug, Clone, PartialEq)]
pub struct PostId(pub serde_json::Value);

impl PostId {
    /// Path of the created post.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/api/p/{self}")
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.0 {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

// =============================================================================
// SUBMITTER
// =============================================================================

/// Runs submissions against one server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Submitter {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Submitter {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    #[must_use]
    pub fn with_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// Upload the form's file, create the post, then navigate to it.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. Errors for which
    /// `SubmitError::shows_status` is true have already been written to
    /// `status`.
    pub async fn submit(
        &self,
        form: &PostForm,
        status: &dyn StatusLine,
        navigator: &dyn Navigator,
    ) -> Result<PostId, SubmitError> {
        match self.run(form, status).await {
            Ok(pid) => {
                let path = pid.path();
                info!(%pid, %path, "submit: navigating to post");
                navigator.navigate(&path);
                Ok(pid)
            }
            Err(e) => {
                warn!(error = %e, "submit: failed");
                if e.shows_status() {
                    status.set_status(&e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn run(&self, form: &PostForm, status: &dyn StatusLine) -> Result<PostId, SubmitError> {
        let fid = self.upload_file(&form.file).await?;
        status.set_status(&format!("fid: {fid}, topic: {}, text: {}", form.topic, form.text));
        self.create_post(fid, &form.topic, &form.text).await
    }

    /// `POST /api/file` with a single `file` part.
    ///
    /// # Errors
    ///
    /// `UploadFailed` on transport failure, `UploadRejected` on a non-success
    /// status, `UnreadableBody` if the body is cut short.
    pub async fn upload_file(&self, file: &FileUpload) -> Result<FileId, SubmitError> {
        let form = Form::new().part("file", file_part(file));
        let response = self
            .http
            .post(self.config.api_url("/api/file"))
            .multipart(form)
            .send()
            .await
            .map_err(SubmitError::UploadFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::UploadRejected { status });
        }

        let body = response.text().await.map_err(SubmitError::UnreadableBody)?;
        let fid = FileId::parse(&body);
        info!(%fid, name = %file.name, bytes = file.bytes.len(), "submit: file uploaded");
        Ok(fid)
    }

    /// `POST /api/post` with `fid`, `topic` and `text` parts.
    ///
    /// # Errors
    ///
    /// `PostFailed` on transport failure, `PostRejected` on a non-success
    /// status, `UnreadableBody` if the body is cut short, `InvalidPostId` if
    /// it is not JSON.
    pub async fn create_post(&self, fid: FileId, topic: &str, text: &str) -> Result<PostId, SubmitError> {
        let form = Form::new()
            .text("fid", fid.to_string())
            .text("topic", topic.to_owned())
            .text("text", text.to_owned());
        let response = self
            .http
            .post(self.config.api_url("/api/post"))
            .multipart(form)
            .send()
            .await
            .map_err(SubmitError::PostFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::PostRejected { status });
        }

        let body = response.bytes().await.map_err(SubmitError::UnreadableBody)?;
        let value = serde_json::from_slice(&body).map_err(SubmitError::InvalidPostId)?;
        Ok(PostId(value))
    }
}

fn file_part(file: &FileUpload) -> Part {
    let part = || Part::bytes(file.bytes.clone()).file_name(file.name.clone());
    part().mime_str(&file.content_type).unwrap_or_else(|e| {
        warn!(content_type = %file.content_type, error = %e, "submit: invalid content type, sending without one");
        part()
    })
}

#[cfg(test)]
#[path = "submit_test.rs"]
mod tests;
