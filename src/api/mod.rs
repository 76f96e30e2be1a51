//! HTTP surface: upload endpoint, replay and task queries, health, UI.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::processor::Registry;
use crate::store::ReplayStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub store: Arc<dyn ReplayStore>,
    /// Uploads are written here; tasks refer to them by file name.
    pub data_dir: PathBuf,
}

/// Build the API router (no UI fallback).
pub fn api_routes(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/api/replays", get(handlers::list_replays))
        .route("/api/replays/{id}", get(handlers::get_replay))
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/tasks/{id}", get(handlers::get_task))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// The full application: API routes, optional UI, CORS.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let app = api_routes(state, config.max_upload_bytes);
    crate::ui::attach(app, config.ui_dir.as_deref()).layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(86400))
}
