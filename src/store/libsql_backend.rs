//! libSQL implementation of [`ReplayStore`](crate::store::ReplayStore).
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::parser::{Record, TeamStats};
use crate::store::migrations;
use crate::store::traits::ReplayStore;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// Every statement goes through `conn_lock`: a transaction open on the shared
/// connection would otherwise be visible to reads issued mid-way.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    conn_lock: Mutex<()>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_database(db).await
    }

    /// Open a local database, retrying with a growing delay.
    ///
    /// Waits `initial_wait` after the first failure and four times longer after
    /// each following one. Returns the last error once `attempts` are used up.
    pub async fn connect_with_retry(
        path: &Path,
        attempts: u32,
        initial_wait: Duration,
    ) -> Result<Self, DatabaseError> {
        let mut wait = initial_wait;
        let mut attempt = 1;
        loop {
            match Self::new_local(path).await {
                Ok(backend) => return Ok(backend),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    warn!(
                        attempt,
                        retry_in = ?wait,
                        error = %e,
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    wait = wait.saturating_mul(4);
                    attempt += 1;
                }
            }
        }
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
            conn_lock: Mutex::new(()),
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

const REPLAY_COLUMNS: &str = "id, home_team, away_team";

/// Map a libsql Row to a Record.
///
/// Column order matches REPLAY_COLUMNS: 0:id, 1:home_team, 2:away_team
fn row_to_record(row: &libsql::Row) -> Result<Record, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("replay row id: {e}")))?;
    let home_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("replay row home_team: {e}")))?;
    let away_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("replay row away_team: {e}")))?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("replay id {id_str}: {e}")))?;
    let home: TeamStats = serde_json::from_str(&home_str).map_err(|e| {
        DatabaseError::Serialization(format!("Failed to decode home team of replay {id}: {e}"))
    })?;
    let away: TeamStats = serde_json::from_str(&away_str).map_err(|e| {
        DatabaseError::Serialization(format!("Failed to decode away team of replay {id}: {e}"))
    })?;

    Ok(Record { id, home, away })
}

/// Classify an insert failure: primary-key clashes are constraint errors.
fn insert_error(e: libsql::Error) -> DatabaseError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint failed") {
        DatabaseError::Constraint(format!("save_replay: {msg}"))
    } else {
        DatabaseError::Query(format!("save_replay: {msg}"))
    }
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl ReplayStore for LibSqlBackend {
    async fn save_replay(&self, record: &Record) -> Result<(), DatabaseError> {
        let home_json = serde_json::to_string(&record.home).map_err(|e| {
            DatabaseError::Serialization(format!("Failed to encode home team data: {e}"))
        })?;
        let away_json = serde_json::to_string(&record.away).map_err(|e| {
            DatabaseError::Serialization(format!("Failed to encode away team data: {e}"))
        })?;

        let _guard = self.conn_lock.lock().await;
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("save_replay begin: {e}")))?;

        // Dropping `tx` without commit rolls the insert back.
        tx.execute(
            "INSERT INTO replays (id, home_team, away_team, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id.to_string(),
                home_json,
                away_json,
                Utc::now().to_rfc3339(),
            ],
        )
        .await
        .map_err(insert_error)?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Query(format!("save_replay commit: {e}")))?;

        debug!(replay_id = %record.id, "Replay saved");
        Ok(())
    }

    async fn list_replays(&self) -> Result<Vec<Record>, DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {REPLAY_COLUMNS} FROM replays ORDER BY created_at ASC, id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_replays: {e}")))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_replays: {e}")))?
        {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    async fn get_replay(&self, id: Uuid) -> Result<Option<Record>, DatabaseError> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {REPLAY_COLUMNS} FROM replays WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_replay: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_replay: {e}"))),
        }
    }
}
