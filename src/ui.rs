//! Static single-page UI served as the router fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    handler::Handler,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tower_http::services::ServeDir;

/// Serve files from `ui_dir` for every path the API does not handle.
///
/// Unknown paths get `index.html` so client-side routes resolve; a missing
/// `.ico` stays a 404. Without a directory the router is returned unchanged.
pub fn attach(router: Router, ui_dir: Option<&Path>) -> Router {
    let Some(dir) = ui_dir else {
        return router;
    };

    tracing::info!(dir = %dir.display(), "Serving UI");
    let index = Arc::new(dir.join("index.html"));
    router.fallback_service(ServeDir::new(dir).fallback(spa_fallback.with_state(index)))
}

async fn spa_fallback(State(index): State<Arc<PathBuf>>, uri: Uri) -> Response {
    if uri.path().ends_with(".ico") {
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::fs::read_to_string(index.as_path()).await {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::warn!(path = %index.display(), error = %e, "UI index missing");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
