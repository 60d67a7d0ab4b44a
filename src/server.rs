//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, the click pipeline, the liveness monitor and
//! the Axum server lifecycle including graceful shutdown.

use crate::application::link_monitor::LinkMonitor;
use crate::application::prober::{HttpProber, PROBE_TIMEOUT};
use crate::application::services::LinkService;
use crate::config::Config;
use crate::domain::click_queue::ClickQueue;
use crate::domain::click_worker::ClickWorkerPool;
use crate::domain::liveness::LivenessTable;
use crate::domain::rate_limiter::RateLimiter;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::persistence::{InMemoryStore, PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Link and click repositories selected from the configuration.
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub clicks: Arc<dyn ClickRepository>,
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations, or the in-memory store
/// - Click queue and worker pool
/// - Link liveness monitor
/// - Axum HTTP server
///
/// On Ctrl-C or SIGTERM the server stops accepting connections, the monitor
/// is cancelled, the click queue is closed and the workers get the configured
/// grace period to drain it.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The probe HTTP client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repositories = connect_repositories(&config).await?;

    let click_queue = ClickQueue::shared(config.click_queue_capacity);
    let workers = ClickWorkerPool::spawn(
        config.click_worker_count,
        click_queue.clone(),
        repositories.clicks.clone(),
    );

    let liveness = Arc::new(LivenessTable::new());
    let prober = HttpProber::new(PROBE_TIMEOUT).context("Failed to build probe client")?;
    let monitor = Arc::new(LinkMonitor::new(
        repositories.links.clone(),
        Arc::new(prober),
        liveness.clone(),
        config.monitor_interval_minutes,
    ));
    let monitor_shutdown = CancellationToken::new();
    let monitor_task = monitor.spawn(monitor_shutdown.clone());

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        config.rate_limit_window(),
    ));

    let link_service = Arc::new(LinkService::new(
        repositories.links.clone(),
        repositories.clicks.clone(),
    ));

    let state = AppState::new(
        link_service,
        click_queue,
        rate_limiter,
        liveness,
        config.base_url.clone(),
        config.behind_proxy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    let served = axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    tracing::info!("HTTP server stopped, shutting down background tasks");

    monitor_shutdown.cancel();
    if let Err(e) = monitor_task.await {
        tracing::error!(error = %e, "Link monitor task failed");
    }

    workers.shutdown(config.click_drain_grace()).await;

    served.context("HTTP server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Selects PostgreSQL when a database URL is configured, otherwise the
/// in-memory store.
///
/// # Errors
///
/// Returns an error if the pool cannot connect or migrations fail.
pub async fn connect_repositories(config: &Config) -> Result<Repositories> {
    let Some(ref database_url) = config.database_url else {
        tracing::warn!("DATABASE_URL not set, links and clicks are kept in memory");
        let store = Arc::new(InMemoryStore::new());
        return Ok(Repositories {
            links: store.clone(),
            clicks: store,
        });
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let pool = Arc::new(pool);
    Ok(Repositories {
        links: Arc::new(PgLinkRepository::new(pool.clone())),
        clicks: Arc::new(PgClickRepository::new(pool)),
    })
}

/// Resolves on Ctrl-C, or on SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
