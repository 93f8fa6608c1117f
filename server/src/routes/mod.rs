//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the HTTP and websocket endpoints under a single Axum
//! router. When a static directory is configured it serves the browser test
//! page at `/`.

pub mod files;
pub mod posts;
pub mod ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let upload_limit = state.config.upload.max_bytes.saturating_add(MULTIPART_OVERHEAD);
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route(
            "/api/file",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/f/{name}", get(files::get_file))
        .route("/api/post", post(posts::create_post))
        .route("/api/p/{pid}", get(posts::get_post))
        .route("/api/t/{topic}", get(posts::list_topic))
        .route("/api/ws/{pid}", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
