//! Tournament tracker HTTP server.
//!
//! Connects to PostgreSQL, applies migrations and serves the JSON API.

use anyhow::{Context, Error};
use pico_args::Arguments;
use std::net::SocketAddr;
use tourney::db::Database;
use tourney_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run the tournament tracker API server

USAGE:
  tourney_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND, PORT or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or DB_* parts]

FLAGS:
  --skip-migrations        Do not apply pending migrations on startup
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  PORT                     Port to listen on all interfaces when SERVER_BIND is unset
  DATABASE_URL             PostgreSQL connection string
  DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME
                           Connection parts used when DATABASE_URL is unset
  DB_MAX_CONNECTIONS       Pool size [default: 10]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let skip_migrations = pargs.contains("--skip-migrations");

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}\n\n{HELP}", remaining);
    }

    logging::init();

    let config = ServerConfig::from_env(bind, database_url, skip_migrations)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        tracing::info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    tracing::info!(
        "Connecting to database ({} max connections)",
        config.database.max_connections
    );
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.health_check()
        .await
        .context("Database health check failed")?;
    tracing::info!("Database connected successfully");

    if config.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    } else {
        tracing::warn!("Skipping database migrations");
    }

    let app = api::create_router(api::AppState::postgres(db.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
