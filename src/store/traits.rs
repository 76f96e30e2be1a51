//! The async persistence interface for decoded replays.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::parser::Record;

/// Backend-agnostic replay storage.
///
/// Implementations must be safe to call concurrently from many workers.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Persist one record. All-or-nothing: on error nothing was written.
    async fn save_replay(&self, record: &Record) -> Result<(), DatabaseError>;

    /// All stored records, oldest first.
    async fn list_replays(&self) -> Result<Vec<Record>, DatabaseError>;

    /// Get a record by ID.
    async fn get_replay(&self, id: Uuid) -> Result<Option<Record>, DatabaseError>;
}
