//! File upload and file serving routes.

use axum::extract::multipart::Multipart;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::services::files::{self, FileError};
use crate::state::AppState;

/// `POST /api/file`: accept one image from the `file` part; answers its id.
pub async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return file_error_response(FileError::MissingFile),
            Err(e) => return (e.status(), e.body_text()).into_response(),
        };
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return (e.status(), e.body_text()).into_response(),
        };

        return match files::accept_upload(&state, &name, content_type.as_deref(), bytes).await {
            Ok(fid) => fid.to_string().into_response(),
            Err(e) => file_error_response(e),
        };
    }
}

/// `GET /api/f/{fid}.{ctype}`: stored image bytes.
pub async fn get_file(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match files::load_file(&state, &name).await {
        Ok((ctype, bytes)) => ([(CONTENT_TYPE, format!("image/{ctype}"))], bytes).into_response(),
        Err(e) => file_error_response(e),
    }
}

fn file_error_status(err: &FileError) -> StatusCode {
    match err {
        FileError::MissingFile | FileError::NotAnImage | FileError::BadName => StatusCode::BAD_REQUEST,
        FileError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        FileError::QueueFull | FileError::WriterStopped => StatusCode::SERVICE_UNAVAILABLE,
        FileError::NotFound => StatusCode::NOT_FOUND,
        FileError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn file_error_response(err: FileError) -> Response {
    let status = file_error_status(&err);
    if status.is_server_error() {
        error!(error = %err, "file request failed");
    }
    (status, err.to_string()).into_response()
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
