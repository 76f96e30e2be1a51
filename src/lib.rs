//! Gobbler, a replay ingest service.
//!
//! Uploaded `.bbrz` replays are queued in an in-process task registry,
//! decoded by a pool of workers and stored in libSQL; a small REST API
//! exposes the stored records and task status.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod parser;
pub mod processor;
pub mod store;
pub mod ui;
