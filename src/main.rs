//! Treenode auth daemon.
//!
//! Loads configuration, prepares the database and runs revocation
//! housekeeping until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use treenode_auth::store::PostgresStore;
use treenode_auth::RevocationCleanup;
use treenode_core::config::AppConfig;
use treenode_core::error::AppError;
use treenode_core::traits::SystemClock;
use treenode_database::DatabasePool;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Daemon error");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the environment overlay and `TREENODE__` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TREENODE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting treenode-authd");

    let db = DatabasePool::connect(&config.database).await?;
    treenode_database::migration::run_migrations(db.pool()).await?;

    let store = Arc::new(PostgresStore::new(&db));
    let cleanup = RevocationCleanup::new(store, Arc::new(SystemClock));

    let minutes = config.maintenance.revocation_cleanup_interval_minutes.max(1);
    let interval = Duration::from_secs(minutes * 60);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = cleanup.spawn(interval, shutdown_rx);
    tracing::info!(
        interval_minutes = minutes,
        "Revocation cleanup scheduled"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Cleanup task ended abnormally");
    }

    db.close().await;
    tracing::info!("treenode-authd stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
