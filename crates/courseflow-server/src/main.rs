//! Courseflow Server - Main entry point

use anyhow::Result;
use courseflow_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use courseflow_server::{
    api::{self, AppState},
    config::{Config, StoreBackend},
    db::{self, DbConfig},
    store::{MemoryStore, PgStore, SharedStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("courseflow-server")
        .filter_directives("courseflow_server=debug,tower_http=debug,axum=info,sqlx=warn")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = log_config.merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Courseflow Server");

    // Load configuration
    let config = Config::load()?;
    info!(
        store = ?config.store,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let state = match config.store {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&DbConfig::from(&config.database)).await?;
            db::run_migrations(&pool).await?;

            AppState {
                store: Arc::new(PgStore::new(pool.clone())) as SharedStore,
                db: Some(pool),
            }
        },
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; all state is lost on shutdown");
            AppState {
                store: Arc::new(MemoryStore::new()) as SharedStore,
                db: None,
            }
        },
    };

    // Build the application router
    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
