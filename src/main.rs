use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gobbler::api::{self, AppState};
use gobbler::config::Config;
use gobbler::logging;
use gobbler::parser::BbrzParser;
use gobbler::processor::{Registry, WorkerDeps};
use gobbler::store::{LibSqlBackend, ReplayStore};

const DB_CONNECT_ATTEMPTS: u32 = 8;
const DB_CONNECT_INITIAL_WAIT: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let _log_guard = logging::init(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind_addr,
        data_dir = %config.server.data_dir.display(),
        "Starting gobbler"
    );

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn ReplayStore> = Arc::new(
        LibSqlBackend::connect_with_retry(
            &config.database.path,
            DB_CONNECT_ATTEMPTS,
            DB_CONNECT_INITIAL_WAIT,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database.path.display()
            )
        })?,
    );

    // ── Task registry ────────────────────────────────────────────────────
    tokio::fs::create_dir_all(&config.server.data_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create data dir {}",
                config.server.data_dir.display()
            )
        })?;

    let registry = Arc::new(Registry::new(
        config.runner.clone(),
        WorkerDeps {
            parser: Arc::new(BbrzParser::new()),
            store: Arc::clone(&store),
            data_dir: config.server.data_dir.clone(),
        },
    ));

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = api::router(
        AppState {
            registry: Arc::clone(&registry),
            store,
            data_dir: config.server.data_dir.clone(),
        },
        &config.server,
    );

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    registry.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received, shutting down..."),
        _ = terminate => tracing::info!("SIGTERM received, shutting down..."),
    }
}
