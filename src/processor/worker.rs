//! Worker: decode and persist one task, then report exactly one [`Update`].

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use super::task::{Task, Update};
use crate::error::{ParseError, TaskError};
use crate::parser::ReplayParser;
use crate::store::ReplayStore;

/// Collaborators shared by every worker.
pub struct WorkerDeps {
    pub parser: Arc<dyn ReplayParser>,
    pub store: Arc<dyn ReplayStore>,
    /// Relative task filenames are resolved against this directory.
    pub data_dir: PathBuf,
}

/// Run one task to completion inside its own fault boundary.
///
/// The processing future runs as a separate tokio task; if it panics the
/// panic is turned into a `Failed` update, so every call yields exactly one
/// update.
pub async fn run(deps: Arc<WorkerDeps>, task: Task) -> Update {
    let task_id = task.id;
    let handle = tokio::spawn(async move {
        match process(&deps, &task).await {
            Ok(replay_id) => {
                tracing::info!(
                    task_id = %task.id,
                    filename = %task.filename,
                    replay_id = %replay_id,
                    "Replay ingested"
                );
                Update::ok(task.id)
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %task.id,
                    filename = %task.filename,
                    error = %e,
                    "Task failed"
                );
                Update::failed(task.id, e)
            }
        }
    });

    match handle.await {
        Ok(update) => update,
        Err(e) => {
            let reason = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            tracing::error!(task_id = %task_id, reason = %reason, "Worker panicked");
            Update::failed(task_id, TaskError::Panicked(reason))
        }
    }
}

/// Read, decode and save. Returns the stored record's id.
async fn process(deps: &WorkerDeps, task: &Task) -> Result<Uuid, TaskError> {
    let path = deps.data_dir.join(&task.filename);
    tracing::debug!(task_id = %task.id, path = %path.display(), "Processing task");

    let raw = tokio::fs::read(&path).await.map_err(|source| TaskError::Read {
        filename: task.filename.clone(),
        source,
    })?;

    let parser = Arc::clone(&deps.parser);
    let decoded = tokio::task::spawn_blocking(move || parser.parse(&raw))
        .await
        .map_err(|e| {
            if e.is_panic() {
                TaskError::Panicked(panic_message(e.into_panic()))
            } else {
                TaskError::Decode {
                    filename: task.filename.clone(),
                    source: ParseError::Archive(e.to_string()),
                }
            }
        })?;
    let record = decoded.map_err(|source| TaskError::Decode {
        filename: task.filename.clone(),
        source,
    })?;

    deps.store
        .save_replay(&record)
        .await
        .map_err(|source| TaskError::Persist {
            record_id: record.id,
            source,
        })?;

    Ok(record.id)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::DatabaseError;
    use crate::parser::{Record, TeamStats};
    use crate::processor::task::TaskStatus;

    /// Parses the raw bytes as a team name.
    struct NameParser;

    impl ReplayParser for NameParser {
        fn parse(&self, raw: &[u8]) -> Result<Record, ParseError> {
            let name = std::str::from_utf8(raw).map_err(|e| ParseError::Xml(e.to_string()))?;
            match name {
                "" => Err(ParseError::MissingMatchResult),
                "panic" => panic!("parser exploded"),
                _ => Ok(Record {
                    id: Uuid::new_v4(),
                    home: TeamStats {
                        name: name.to_string(),
                        ..TeamStats::default()
                    },
                    away: TeamStats::default(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<Record>>,
        fail: bool,
    }

    #[async_trait]
    impl ReplayStore for MemoryStore {
        async fn save_replay(&self, record: &Record) -> Result<(), DatabaseError> {
            if self.fail {
                return Err(DatabaseError::Query("disk full".to_string()));
            }
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn list_replays(&self) -> Result<Vec<Record>, DatabaseError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn get_replay(&self, id: Uuid) -> Result<Option<Record>, DatabaseError> {
            Ok(self.saved.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }
    }

    fn deps(dir: &tempfile::TempDir, store: Arc<MemoryStore>) -> Arc<WorkerDeps> {
        Arc::new(WorkerDeps {
            parser: Arc::new(NameParser),
            store,
            data_dir: dir.path().to_path_buf(),
        })
    }

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> Task {
        std::fs::write(dir.path().join(name), body).unwrap();
        Task::new(name)
    }

    #[tokio::test]
    async fn success_saves_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let task = write(&dir, "a.bbrz", "Reavers");

        let update = run(deps(&dir, store.clone()), task.clone()).await;

        assert_eq!(update, Update::ok(task.id));
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].home.name, "Reavers");
    }

    #[tokio::test]
    async fn missing_file_fails_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());

        let update = run(deps(&dir, store.clone()), Task::new("nope.bbrz")).await;

        assert_eq!(update.status, TaskStatus::Failed);
        assert!(update.error.unwrap().contains("Failed to read nope.bbrz"));
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn decode_error_fails_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let task = write(&dir, "empty.bbrz", "");

        let update = run(deps(&dir, store.clone()), task).await;

        assert_eq!(update.status, TaskStatus::Failed);
        assert!(update.error.unwrap().contains("Failed to decode empty.bbrz"));
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn persist_error_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });
        let task = write(&dir, "a.bbrz", "Reavers");

        let update = run(deps(&dir, store), task).await;

        assert_eq!(update.status, TaskStatus::Failed);
        assert!(update.error.unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn parser_panic_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let task = write(&dir, "boom.bbrz", "panic");

        let update = run(deps(&dir, store), task).await;

        assert_eq!(update.status, TaskStatus::Failed);
        let error = update.error.unwrap();
        assert!(error.contains("Worker panicked"), "got {error}");
        assert!(error.contains("parser exploded"), "got {error}");
    }
}
