//! EventHub HTTP server.

use anyhow::Context;
use eventhub_auth::{PasswordHasher, TokenCodec};
use eventhub_core::environment::SystemClock;
use eventhub_postgres::{
    PostgresEventRepository, PostgresRegistrationRepository, PostgresUserRepository,
};
use eventhub_server::{
    AppState, Config, Repositories, Services, build_router, email, metrics,
    server::routes::cors_layer,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::watch};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventhub_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EventHub server");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    if config.uses_dev_secret() {
        warn!("AUTH_JWT_SECRET is not set; using the development secret");
    }
    info!(
        environment = ?config.environment,
        port = config.server.port,
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    info!("Connecting to database...");
    let pool = eventhub_postgres::connect(&config.database.url, &config.pool_settings())
        .await
        .context("Failed to connect to database")?;
    eventhub_postgres::migrate(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database ready");

    let repos = Repositories {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        events: Arc::new(PostgresEventRepository::new(pool.clone())),
        registrations: Arc::new(PostgresRegistrationRepository::new(pool)),
    };

    let mailer = email::build_mailer(&config.email)?;

    metrics::register_business_metrics();
    metrics::install_exporter(config.metrics_addr()?)?;
    info!(addr = %config.metrics_addr()?, "Metrics exporter listening");

    let services = Services::new(
        repos,
        mailer,
        Arc::new(SystemClock),
        TokenCodec::new(config.token_config()),
        PasswordHasher::new(config.password_config()),
    );

    let cors = cors_layer(config.server.cors_allowed_origin.as_deref())
        .context("Invalid CORS_ALLOWED_ORIGIN")?;
    let app = build_router(AppState::new(services), cors);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Server listening");

    let (stopping_tx, stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stopping_tx.send(true);
    });

    tokio::select! {
        result = server.into_future() => result.context("Server error")?,
        () = drain_deadline(stopping_rx, config.shutdown_timeout()) => {
            warn!("In-flight requests did not finish in time, exiting");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves `timeout` after shutdown starts.
async fn drain_deadline(mut stopping: watch::Receiver<bool>, timeout: Duration) {
    if stopping.wait_for(|stopping| *stopping).await.is_err() {
        // Sender dropped without signalling: the server already returned.
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (on Unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
