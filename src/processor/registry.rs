//! Task registry: accepts uploads, dispatches workers, tracks status.
//!
//! A single control loop owns every change of collection membership:
//! - claims `Waiting` tasks (on each interval tick and whenever `submit`
//!   signals it) and spawns a worker per claimed task, bounded by a semaphore;
//! - absorbs worker completion messages, moving each task from the active
//!   collection to the processed one;
//! - on shutdown, stops dispatching and drains outstanding completions.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Notify, Semaphore, mpsc, watch};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::collection::TaskCollection;
use super::task::{Task, Update};
use super::worker::{self, WorkerDeps};
use crate::config::RunnerConfig;

/// In-process job tracker for replay ingestion.
pub struct Registry {
    active: Arc<TaskCollection>,
    processed: Arc<TaskCollection>,
    /// Held for writing while a task moves between collections.
    handoff: Arc<RwLock<()>>,
    wake: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    stopped_rx: watch::Receiver<bool>,
}

impl Registry {
    /// Create the registry and start its control loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: RunnerConfig, deps: WorkerDeps) -> Self {
        let active = Arc::new(TaskCollection::new());
        let processed = Arc::new(TaskCollection::new());
        let handoff = Arc::new(RwLock::new(()));
        let wake = Arc::new(Notify::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (stopped_tx, stopped_rx) = watch::channel(false);
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let control = ControlLoop {
            permits: Arc::new(Semaphore::new(config.max_concurrent_workers.max(1))),
            config,
            deps: Arc::new(deps),
            active: Arc::clone(&active),
            processed: Arc::clone(&processed),
            handoff: Arc::clone(&handoff),
            wake: Arc::clone(&wake),
            updates_tx,
            updates_rx,
            in_flight: 0,
        };
        tokio::spawn(control.run(shutdown_rx, stopped_tx));

        Self {
            active,
            processed,
            handoff,
            wake,
            shutdown_tx,
            stopped_rx,
        }
    }

    /// Queue an artifact for processing and return its task id.
    ///
    /// Never fails; the filename is not validated here. Tasks submitted
    /// after `stop` stay `Waiting`.
    pub fn submit(&self, filename: impl Into<String>) -> Uuid {
        let task = Task::new(filename);
        let id = task.id;
        tracing::debug!(task_id = %id, filename = %task.filename, "Task submitted");
        self.active.add(task);
        self.wake.notify_one();
        id
    }

    /// Look up a task in either collection.
    pub fn status(&self, id: Uuid) -> Option<Task> {
        let _guard = self.handoff.read().unwrap_or_else(PoisonError::into_inner);
        self.active.get(id).or_else(|| self.processed.get(id))
    }

    /// Every known task, oldest first.
    pub fn tasks(&self) -> Vec<Task> {
        let mut all = {
            let _guard = self.handoff.read().unwrap_or_else(PoisonError::into_inner);
            let mut all = self.active.snapshot();
            all.extend(self.processed.snapshot());
            all
        };
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Copy of the tasks not yet finished, oldest first.
    pub fn active_tasks(&self) -> Vec<Task> {
        let _guard = self.handoff.read().unwrap_or_else(PoisonError::into_inner);
        self.active.snapshot()
    }

    /// Copy of the tasks in a terminal state, oldest first.
    pub fn processed_tasks(&self) -> Vec<Task> {
        let _guard = self.handoff.read().unwrap_or_else(PoisonError::into_inner);
        self.processed.snapshot()
    }

    #[cfg(test)]
    fn active(&self) -> &TaskCollection {
        &self.active
    }

    #[cfg(test)]
    fn processed(&self) -> &TaskCollection {
        &self.processed
    }

    /// Request shutdown and wait for it to finish.
    ///
    /// Stops dispatching new workers, waits for every dispatched worker to
    /// report, then returns. Calling it again is harmless.
    pub async fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            tracing::info!("Registry stopping");
        }
        self.wait_stopped().await;
    }

    /// Resolve once the control loop has exited after a `stop`.
    pub async fn wait_stopped(&self) {
        let mut stopped = self.stopped_rx.clone();
        // An error means the loop is gone, which is also "stopped".
        let _ = stopped.wait_for(|done| *done).await;
    }

    /// Whether the control loop has exited.
    pub fn is_stopped(&self) -> bool {
        *self.stopped_rx.borrow()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

// ── Control loop ────────────────────────────────────────────────────

struct ControlLoop {
    config: RunnerConfig,
    deps: Arc<WorkerDeps>,
    active: Arc<TaskCollection>,
    processed: Arc<TaskCollection>,
    handoff: Arc<RwLock<()>>,
    wake: Arc<Notify>,
    permits: Arc<Semaphore>,
    updates_tx: mpsc::UnboundedSender<Update>,
    updates_rx: mpsc::UnboundedReceiver<Update>,
    in_flight: usize,
}

impl ControlLoop {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>, stopped: watch::Sender<bool>) {
        let mut interval = tokio::time::interval(self.config.task_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = self.config.task_interval.as_millis() as u64,
            max_workers = self.config.max_concurrent_workers,
            "Task registry started"
        );

        loop {
            tokio::select! {
                biased;
                // Only ever flips to true; a closed channel means the registry is gone.
                _ = shutdown.changed() => break,
                Some(update) = self.updates_rx.recv() => {
                    self.complete(update);
                    self.dispatch();
                }
                _ = self.wake.notified() => self.dispatch(),
                _ = interval.tick() => self.dispatch(),
            }
        }

        tracing::info!(in_flight = self.in_flight, "Draining workers");
        while self.in_flight > 0 {
            match self.updates_rx.recv().await {
                Some(update) => self.complete(update),
                None => break,
            }
        }

        tracing::info!(
            processed = self.processed.len(),
            left_waiting = self.active.len(),
            "Task registry stopped"
        );
        let _ = stopped.send(true);
    }

    /// Claim as many waiting tasks as there are free permits and spawn a
    /// worker for each.
    fn dispatch(&mut self) {
        let mut permits: Vec<_> =
            std::iter::from_fn(|| Arc::clone(&self.permits).try_acquire_owned().ok()).collect();
        if permits.is_empty() {
            return;
        }

        for task in self.active.claim_waiting(permits.len()) {
            let Some(permit) = permits.pop() else { break };
            let deps = Arc::clone(&self.deps);
            let updates = self.updates_tx.clone();
            tracing::debug!(task_id = %task.id, filename = %task.filename, "Dispatching worker");

            self.in_flight += 1;
            tokio::spawn(async move {
                let update = worker::run(deps, task).await;
                drop(permit);
                let _ = updates.send(update);
            });
        }
    }

    /// Move a finished task from active to processed.
    fn complete(&mut self, update: Update) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let _guard = self.handoff.write().unwrap_or_else(PoisonError::into_inner);
        let Some(mut task) = self.active.delete(update.task_id) else {
            tracing::warn!(task_id = %update.task_id, "Completion for unknown task");
            return;
        };
        task.set_status(update.status, update.error);
        tracing::debug!(task_id = %task.id, status = %task.status, "Task finished");
        self.processed.add(task);
    }
}
