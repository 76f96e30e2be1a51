//! Task model and the completion message workers report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a task: `Waiting → Processing → {Ok, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Submitted, not yet picked up by the control loop.
    Waiting,
    /// Claimed by the control loop; a worker is running.
    Processing,
    /// Decoded and persisted.
    Ok,
    /// Decoding or persisting failed; see `Task::error`.
    Failed,
}

impl TaskStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Ok => "ok",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One unit of ingest work: a stored upload waiting to be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    /// Artifact name, resolved against the data directory by the worker.
    pub filename: String,
    pub status: TaskStatus,
    /// Set only when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A fresh `Waiting` task with a new random id.
    pub fn new(filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            status: TaskStatus::Waiting,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus, error: Option<String>) {
        self.status = status;
        self.error = error;
        self.updated_at = Utc::now();
    }
}

/// Completion message: sent exactly once by a task's worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub error: Option<String>,
}

impl Update {
    pub fn ok(task_id: Uuid) -> Self {
        Self {
            task_id,
            status: TaskStatus::Ok,
            error: None,
        }
    }

    pub fn failed(task_id: Uuid, error: impl std::fmt::Display) -> Self {
        Self {
            task_id,
            status: TaskStatus::Failed,
            error: Some(error.to_string()),
        }
    }
}
