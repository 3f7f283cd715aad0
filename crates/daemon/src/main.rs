//! SiteBatch Daemon - Main Entry Point
//! Wires the SQLite store, the simulated creator, the job controller and the
//! JSON-RPC server together.

mod config;

use anyhow::{Context, Result};
use config::{DaemonConfig, LogFormat};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use sitebatch_api_rpc::RpcServer;
use sitebatch_core::application::{BatchJobService, JobController};
use sitebatch_core::port::id_provider::UuidProvider;
use sitebatch_core::port::time_provider::SystemTimeProvider;
use sitebatch_infra_artifact::SimulatedArtifactCreator;
use sitebatch_infra_sqlite::{create_pool, run_migrations, SqliteJobRepository};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_FILE_PREFIX: &str = "sitebatch.log";

/// Install the tracing subscriber
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("sitebatch=info"))
        .context("Failed to create env filter")?;

    let console = match config.log_format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn ensure_parent_dir(db_path: &str) -> Result<()> {
    if db_path.starts_with("sqlite:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env()?;
    let _log_guard = init_logging(&config)?;

    info!("SiteBatch daemon v{} starting...", VERSION);

    // 2. Database
    info!(db_path = %config.db_path, "Initializing database...");
    ensure_parent_dir(&config.db_path)?;
    let pool = create_pool(&config.database_url())
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. Dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let job_repo = Arc::new(SqliteJobRepository::new(pool.clone()));
    let creator = Arc::new(SimulatedArtifactCreator::new(
        config.simulator,
        id_provider.clone(),
        time_provider.clone(),
    ));

    let controller = Arc::new(JobController::new(
        job_repo,
        creator,
        time_provider.clone(),
        config.engine,
    ));

    // 4. Re-attach jobs that were running or paused at shutdown
    info!("Restoring persisted jobs...");
    let attached = controller.restore().await.context("Job restore failed")?;
    info!(attached_runners = attached, "Restore completed");

    let service = Arc::new(BatchJobService::new(
        controller,
        id_provider,
        time_provider,
    ));

    // 5. JSON-RPC server
    let rpc_server = RpcServer::new(config.rpc.clone(), service);
    let (addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received. Exiting gracefully...");

    // Runners commit after every item; in-flight items are simply redone
    // after the next restore.
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}
