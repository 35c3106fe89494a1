//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, migrations, the mail worker, the late-return
//! model, account seeding and the Axum server lifecycle.

use crate::config::Config;
use crate::domain::mail::Notifier;
use crate::domain::mail_worker::run_mail_worker;
use crate::infrastructure::mail::LogMailer;
use crate::infrastructure::persistence::PgOutboxRepository;
use crate::infrastructure::predictor::load_predictor;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Opens the connection pool with the configured limits.
pub async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Background mail worker
/// - Late-return predictor (or the disabled fallback)
/// - Super admin accounts, when `SUPER_ADMIN_PASSWORD` is set
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let pool = Arc::new(pool);

    let (mail_tx, mail_rx) = mpsc::channel(config.mail_queue_capacity);
    let mail_worker = tokio::spawn(run_mail_worker(
        mail_rx,
        Arc::new(LogMailer::new()),
        Arc::new(PgOutboxRepository::new(pool.clone())),
    ));
    tracing::info!("Mail worker started");

    let predictor = load_predictor(config.late_model_path.as_deref());

    let state = AppState::new(&config, pool, Notifier::new(mail_tx), predictor);

    if let Some(password) = &config.super_admin_password {
        let created = state.admin_service.seed_super_admins(password).await?;
        if created > 0 {
            tracing::info!(created, "Super admins seeded");
        }
    }

    match state.auth_service.purge_expired().await {
        Ok(purged) => tracing::info!(purged, "Expired sessions purged"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
    }

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned the last notifier.
    drain_mail(mail_worker).await
}

/// Waits for the mail worker to deliver what is still queued.
///
/// Every [`Notifier`] must be dropped first, otherwise this never returns.
pub async fn drain_mail(worker: JoinHandle<()>) -> Result<()> {
    tracing::info!("Delivering queued mail");
    worker.await.context("Mail worker panicked")
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}
