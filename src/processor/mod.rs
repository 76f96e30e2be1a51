//! Asynchronous ingest pipeline: tasks, their collections, workers and the
//! registry that drives them.

pub mod collection;
pub mod registry;
pub mod task;
pub mod worker;

pub use collection::TaskCollection;
pub use registry::Registry;
pub use task::{Task, TaskStatus, Update};
pub use worker::WorkerDeps;
