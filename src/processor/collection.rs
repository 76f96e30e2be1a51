//! Lock-guarded task map shared between the registry and its callers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::task::{Task, TaskStatus, Update};

/// Concurrency-safe map of task id → [`Task`].
///
/// A single mutex covers every operation. It is a std mutex and is never held
/// across an `.await` or while user code runs.
#[derive(Debug, Default)]
pub struct TaskCollection {
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite the entry for `task.id`.
    pub fn add(&self, task: Task) {
        self.lock().insert(task.id, task);
    }

    /// Remove an entry, returning it if it was present.
    pub fn delete(&self, id: Uuid) -> Option<Task> {
        self.lock().remove(&id)
    }

    /// Get a copy of an entry.
    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.lock().get(&id).cloned()
    }

    /// Apply a completion message in place. Returns false if the task is absent.
    pub fn update(&self, update: &Update) -> bool {
        match self.lock().get_mut(&update.task_id) {
            Some(task) => {
                task.set_status(update.status, update.error.clone());
                true
            }
            None => false,
        }
    }

    /// Visit every entry once.
    ///
    /// Entries are copied out under the lock and `visit` runs after it is
    /// released, so `visit` may call back into this collection.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(Uuid, &Task),
    {
        for task in self.snapshot() {
            visit(task.id, &task);
        }
    }

    /// Mark up to `limit` waiting tasks as processing, oldest first, and
    /// return them. Selection and marking happen under one lock acquisition.
    pub fn claim_waiting(&self, limit: usize) -> Vec<Task> {
        if limit == 0 {
            return Vec::new();
        }

        let mut tasks = self.lock();
        let mut waiting: Vec<(chrono::DateTime<chrono::Utc>, Uuid)> = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Waiting)
            .map(|t| (t.created_at, t.id))
            .collect();
        waiting.sort_unstable();

        waiting
            .into_iter()
            .take(limit)
            .filter_map(|(_, id)| {
                let task = tasks.get_mut(&id)?;
                task.set_status(TaskStatus::Processing, None);
                Some(task.clone())
            })
            .collect()
    }

    /// Copy of every entry, oldest first.
    pub fn snapshot(&self) -> Vec<Task> {
        let mut all: Vec<Task> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
