//! ccrm-api - HTTP service for the call-center CRM
//!
//! Startup order: arguments, configuration, logging, store, router.
//! The store handle and event bus are created here once and injected into
//! the router state.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ccrm_api::{build_router, AppState, EVENT_BUS_CAPACITY};
use ccrm_common::config::{load_toml_config, RootFolderInitializer, RootFolderResolver};
use ccrm_common::events::EventBus;
use ccrm_common::logging::init_tracing;
use ccrm_common::store::open_pool;
use ccrm_common::DocumentStore;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for ccrm-api
///
/// Each option falls back to its environment variable, then to the TOML
/// config file, then to the compiled default.
#[derive(Parser, Debug)]
#[command(name = "ccrm-api")]
#[command(about = "Call-center CRM HTTP service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "CCRM_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the store files
    #[arg(short, long, env = "CCRM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CCRM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CCRM_PORT")]
    port: Option<u16>,

    /// Store instance; selects `<root>/<project_id>.db`
    #[arg(long, env = "CCRM_PROJECT_ID")]
    project_id: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "CCRM_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(project_id) = args.project_id {
        config.store.project_id = project_id;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting ccrm-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("ccrm-api")
        .with_cli_arg(args.root_folder)
        .with_config(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path(&config.store.project_id);
    info!("Store: {} (project '{}')", db_path.display(), config.store.project_id);

    let pool = match open_pool(&db_path, config.store.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open store: {}", e);
            return Err(e.into());
        }
    };
    let store = DocumentStore::from_pool(pool);

    let state = AppState::new(store, EventBus::new(EVENT_BUS_CAPACITY))
        .with_duplicate_policy(config.duplicates.clone())
        .with_scheduling(config.scheduling.clone());
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("ccrm-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
