//! Error types for gobbler.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Replay decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid replay archive: {0}")]
    Archive(String),

    #[error("Replay archive contains no entries")]
    EmptyArchive,

    #[error("Malformed replay XML: {0}")]
    Xml(String),

    #[error("Replay has no finished-game result")]
    MissingMatchResult,

    #[error("Replay result lists {found} coaches, expected 2")]
    MissingCoaches { found: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures recorded on a task by its worker.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Failed to read {filename}: {source}")]
    Read {
        filename: String,
        source: std::io::Error,
    },

    #[error("Failed to decode {filename}: {source}")]
    Decode {
        filename: String,
        source: ParseError,
    },

    #[error("Failed to save replay {record_id}: {source}")]
    Persist {
        record_id: uuid::Uuid,
        source: DatabaseError,
    },

    #[error("Worker panicked: {0}")]
    Panicked(String),
}
