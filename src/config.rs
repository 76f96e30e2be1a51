//! Configuration types.
//!
//! Everything is read once from `GOBBLER_*` environment variables into an
//! explicit [`Config`] value that is passed down to the components that need
//! it. Nothing here is process-global.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default upload ceiling for `POST /upload` (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub runner: RunnerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

/// HTTP listener and upload handling.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory uploaded replays are written to and read back from.
    pub data_dir: PathBuf,
    /// Directory holding the built single-page UI. Not served when unset.
    pub ui_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("./data"),
            ui_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Task registry tuning.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How often the control loop sweeps for waiting tasks.
    pub task_interval: Duration,
    /// Upper bound on workers running at the same time.
    pub max_concurrent_workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            task_interval: Duration::from_secs(1),
            max_concurrent_workers: 16,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogKind {
    #[default]
    Stdout,
    File,
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "file" => Ok(Self::File),
            other => Err(format!("unknown log kind '{other}' (expected stdout or file)")),
        }
    }
}

/// Logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub kind: LogKind,
    /// Log file path, used when `kind` is [`LogKind::File`].
    pub path: PathBuf,
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            kind: LogKind::Stdout,
            path: PathBuf::from("./logs/gobbler.log"),
            level: "info".to_string(),
        }
    }
}

/// libSQL database location.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/gobbler.db"),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-invalid values are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let server = ServerConfig {
            bind_addr: parse_or(&lookup, "GOBBLER_BIND_ADDR", defaults.server.bind_addr)?,
            data_dir: lookup("GOBBLER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.server.data_dir),
            ui_dir: lookup("GOBBLER_UI_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_or(
                &lookup,
                "GOBBLER_MAX_UPLOAD_BYTES",
                defaults.server.max_upload_bytes,
            )?,
        };

        let interval_ms: u64 = parse_or(
            &lookup,
            "GOBBLER_RUNNER_TASK_INTERVAL_MS",
            defaults.runner.task_interval.as_millis() as u64,
        )?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "GOBBLER_RUNNER_TASK_INTERVAL_MS".to_string(),
                message: "interval must be greater than zero".to_string(),
            });
        }

        let max_workers: usize = parse_or(
            &lookup,
            "GOBBLER_RUNNER_MAX_WORKERS",
            defaults.runner.max_concurrent_workers,
        )?;
        if max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "GOBBLER_RUNNER_MAX_WORKERS".to_string(),
                message: "at least one worker is required".to_string(),
            });
        }

        let runner = RunnerConfig {
            task_interval: Duration::from_millis(interval_ms),
            max_concurrent_workers: max_workers,
        };

        let logging = LoggingConfig {
            format: parse_or(&lookup, "GOBBLER_LOGGING_FORMAT", defaults.logging.format)?,
            kind: parse_or(&lookup, "GOBBLER_LOGGING_KIND", defaults.logging.kind)?,
            path: lookup("GOBBLER_LOGGING_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.logging.path),
            level: lookup("GOBBLER_LOGGING_LEVEL").unwrap_or(defaults.logging.level),
        };

        let database = DatabaseConfig {
            path: lookup("GOBBLER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database.path),
        };

        Ok(Self {
            server,
            runner,
            logging,
            database,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
