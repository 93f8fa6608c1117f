//! Post routes: create, read one, list by topic.

use std::collections::HashMap;

use axum::extract::multipart::Multipart;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

use crate::services::posts::{self, PostError};
use crate::state::AppState;

/// `POST /api/post`: multipart text fields `fid`, `topic`, `text`; answers
/// the new pid as JSON.
pub async fn create_post(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut fields: HashMap<String, String> = HashMap::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(name) = field.name().map(str::to_owned) else {
                    continue;
                };
                match field.text().await {
                    Ok(value) => {
                        fields.entry(name).or_insert(value);
                    }
                    Err(e) => return (e.status(), e.body_text()).into_response(),
                }
            }
            Ok(None) => break,
            Err(e) => return (e.status(), e.body_text()).into_response(),
        }
    }

    let fid = fields.get("fid").map_or("", String::as_str);
    let topic = fields.get("topic").map_or("", String::as_str);
    let text = fields.get("text").map_or("", String::as_str);
    match posts::create_post(&state, fid, topic, text).await {
        Ok(pid) => Json(pid).into_response(),
        Err(e) => post_error_response(e),
    }
}

/// `GET /api/p/{pid}`
pub async fn get_post(State(state): State<AppState>, Path(pid): Path<String>) -> Response {
    match posts::get_post(&state, &pid).await {
        Ok(post) => Json(post).into_response(),
        Err(e) => post_error_response(e),
    }
}

/// `GET /api/t/{topic}`
pub async fn list_topic(State(state): State<AppState>, Path(topic): Path<String>) -> Response {
    match posts::list_topic(&state, &topic).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => post_error_response(e),
    }
}

fn post_error_status(err: &PostError) -> StatusCode {
    match err {
        PostError::InvalidFid
        | PostError::UnknownFid
        | PostError::InvalidTopic
        | PostError::InvalidText
        | PostError::InvalidPid => StatusCode::BAD_REQUEST,
        PostError::NotFound => StatusCode::NOT_FOUND,
        PostError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn post_error_response(err: PostError) -> Response {
    let status = post_error_status(&err);
    if status.is_server_error() {
        error!(error = %err, "post request failed");
    }
    (status, err.to_string()).into_response()
}

#[cfg(test)]
#[path = "posts_test.rs"]
mod tests;
