//! Request handlers.

use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::AppState;

const UPLOAD_FIELD: &str = "replay";

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

// ── Health ──────────────────────────────────────────────────────────────

pub(super) async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// ── Upload ──────────────────────────────────────────────────────────────

/// Store the `replay` multipart field and queue it for processing.
pub(super) async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Rejected upload");
                return error_body(e.status(), e.body_text());
            }
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let client_name = field.file_name().unwrap_or_default().to_string();
        let filename = stored_name(&client_name);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(client_name = %client_name, error = %e, "Rejected upload");
                return error_body(e.status(), e.body_text());
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&state.data_dir).await {
            error!(dir = %state.data_dir.display(), error = %e, "Failed to create data dir");
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload");
        }
        let path = state.data_dir.join(&filename);
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            error!(path = %path.display(), error = %e, "Failed to write upload");
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload");
        }

        let task_id = state.registry.submit(filename.clone());
        info!(
            task_id = %task_id,
            client_name = %client_name,
            filename = %filename,
            size = bytes.len(),
            "Upload queued"
        );
        return (
            StatusCode::ACCEPTED,
            Json(json!({ "task_id": task_id, "filename": filename, "status": "waiting" })),
        );
    }

    error_body(
        StatusCode::BAD_REQUEST,
        format!("Missing multipart field '{UPLOAD_FIELD}'"),
    )
}

/// Name an upload on disk: a fresh UUID, then the client's file name reduced
/// to its final component. Every upload gets its own file.
fn stored_name(client_name: &str) -> String {
    let id = Uuid::new_v4();
    let base = client_name
        .rsplit(['/', '\\'])
        .next()
        .and_then(|name| FsPath::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..");

    match base {
        Some(base) => format!("{id}-{base}"),
        None => format!("{id}.bbrz"),
    }
}

// ── Replays ─────────────────────────────────────────────────────────────

pub(super) async fn list_replays(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_replays().await {
        Ok(records) => (StatusCode::OK, Json(json!(records))),
        Err(e) => {
            error!(error = %e, "Failed to list replays");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list replays")
        }
    }
}

pub(super) async fn get_replay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(replay_id) = Uuid::parse_str(&id) else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid replay ID");
    };

    match state.store.get_replay(replay_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(json!(record))),
        Ok(None) => error_body(StatusCode::NOT_FOUND, "Replay not found"),
        Err(e) => {
            error!(replay_id = %replay_id, error = %e, "Failed to load replay");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load replay")
        }
    }
}

// ── Tasks ───────────────────────────────────────────────────────────────

pub(super) async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.tasks())
}

pub(super) async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(task_id) = Uuid::parse_str(&id) else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid task ID");
    };

    match state.registry.status(task_id) {
        Some(task) => (StatusCode::OK, Json(json!(task))),
        None => error_body(StatusCode::NOT_FOUND, "Task not found"),
    }
}
