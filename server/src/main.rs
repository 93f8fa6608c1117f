mod config;
mod db;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");

    tokio::fs::create_dir_all(&config.upload.dir)
        .await
        .expect("failed to create upload directory");

    let store: Arc<dyn Store> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let port = config.port;
    let state = state::AppState::new(store, config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "quad server listening");
    axum::serve(listener, app).await.expect("server failed");
}
