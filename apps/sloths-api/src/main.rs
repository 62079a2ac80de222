//! # Sloths API server
//!
//! Loads configuration, opens the SQLite database (running migrations) and
//! serves HTTP until Ctrl+C or SIGTERM.

use anyhow::Context;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sloths_api::auth::JwtManager;
use sloths_api::{build_router, ApiConfig, AppState};
use sloths_db::{Database, DbConfig};

/// How often expired entries are dropped from the revocation list.
const REVOKED_TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it carries the default log level
    let config = ApiConfig::load().context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Sloths API server...");
    info!(
        port = config.http_port,
        database = %config.database_path,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the built-in development JWT secret; set SLOTHS_JWT_SECRET in production");
    }

    let db_config = DbConfig::new(&config.database_path).max_connections(config.max_connections);
    let db = Database::new(db_config)
        .await
        .with_context(|| format!("opening database {}", config.database_path))?;
    info!("Database ready");

    let state = AppState::new(
        db.clone(),
        JwtManager::new(&config.jwt_secret, config.jwt_access_lifetime_secs),
    );

    tokio::spawn(purge_revoked_tokens(db.clone()));

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Periodically removes revocation entries whose tokens have expired anyway.
async fn purge_revoked_tokens(db: Database) {
    let mut ticker = interval(REVOKED_TOKEN_PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        match db.users().purge_expired_tokens(Utc::now()).await {
            Ok(purged) => debug!(purged, "Purged expired revoked tokens"),
            Err(e) => warn!(error = %e, "Failed to purge revoked tokens"),
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
