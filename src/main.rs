//! Trailpass Server: credential and session lifecycle service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use trailpass_api::{AppState, build_router};
use trailpass_auth::notifier::TracingNotifier;
use trailpass_core::clock::{Clock, SystemClock};
use trailpass_core::config::AppConfig;
use trailpass_core::error::AppError;
use trailpass_database::store::UserStore;
use trailpass_database::{DatabasePool, MemoryUserStore, PgUserRepository};

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
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `TRAILPASS_ENV`.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TRAILPASS_ENV").unwrap_or_else(|_| "development".to_string());
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

/// Open the user store: PostgreSQL when configured, otherwise in memory.
async fn open_store(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> Result<(Arc<dyn UserStore>, Option<DatabasePool>), AppError> {
    if config.database.url.is_none() {
        tracing::warn!("database.url is not set; users are kept in memory and lost on restart");
        return Ok((Arc::new(MemoryUserStore::with_clock(clock)), None));
    }

    let db = DatabasePool::connect(&config.database).await?;
    trailpass_database::migration::run_migrations(db.pool()).await?;
    let store = Arc::new(PgUserRepository::new(db.pool().clone()));
    Ok((store, Some(db)))
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        environment = %config.environment,
        "Starting Trailpass v{}",
        env!("CARGO_PKG_VERSION")
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (store, db) = open_store(&config, clock.clone()).await?;
    let notifier = Arc::new(TracingNotifier::new(config.server.public_url.clone()));
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::build(config, store, notifier, clock)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Trailpass server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("Trailpass server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
