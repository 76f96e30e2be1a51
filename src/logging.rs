//! Tracing subscriber setup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogKind, LoggingConfig};
use crate::error::ConfigError;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. The returned guard flushes the
/// background writer on drop and must be held for the lifetime of the process.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::InvalidValue {
            key: "GOBBLER_LOGGING_LEVEL".to_string(),
            message: e.to_string(),
        })?;

    let (writer, guard) = match config.kind {
        LogKind::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogKind::File => {
            let file_name = config.path.file_name().ok_or_else(|| ConfigError::InvalidValue {
                key: "GOBBLER_LOGGING_PATH".to_string(),
                message: format!("{} does not name a file", config.path.display()),
            })?;
            let dir = config
                .path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.kind == LogKind::Stdout);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_target(true).try_init(),
    };
    installed.map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(guard)
}
