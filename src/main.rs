//! Beacon telemetry collection service.
//!
//! Main entry point: loads configuration, prepares the database, starts the
//! retention cleanup scheduler and serves the collector API until a
//! shutdown signal arrives. Shutdown cancels the scheduler (an in-flight
//! sweep finishes first) before closing database connections.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use beacon_api::{AppState, CleanupScheduler, Config, PostgresRetentionStore};
use beacon_core::{storage::Storage, Clock, RealClock};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.rust_log);

    info!("starting beacon telemetry service");
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        retention_days = config.retention_days,
        cleanup_interval_hours = config.cleanup_interval_hours,
        auto_cleanup = config.auto_cleanup_enabled,
        "configuration loaded"
    );

    let pool = create_database_pool(&config).await?;
    info!("database connection pool established");

    run_migrations(&pool).await?;
    info!("database schema ready");

    let storage = Storage::new(pool.clone());
    let clock: Arc<dyn Clock> = Arc::new(RealClock);
    let retention = config.to_retention_config();

    let scheduler = CleanupScheduler::new(
        Arc::new(PostgresRetentionStore::new(storage.clone())),
        retention,
        clock.clone(),
    );
    let cleanup_token = scheduler.cancellation_token();
    let scheduler_handle = scheduler.spawn();

    let state = AppState::new(storage, clock, retention);
    let addr = config.parse_server_addr()?;

    beacon_api::start_server(state, addr, shutdown_signal()).await.context("server failed")?;

    info!("shutdown signal received, stopping retention scheduler");
    cleanup_token.cancel();
    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "retention scheduler task failed during shutdown");
    }

    pool.close().await;
    info!("database connections closed, shutdown complete");

    Ok(())
}

/// Initializes tracing; `RUST_LOG` wins over the configured level.
fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool, retrying while the database boots.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(_e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}

/// Creates the telemetry tables and indexes if they do not exist yet.
async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_events (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT,
            session_id TEXT,
            event_type TEXT NOT NULL,
            event_category TEXT,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            event_metadata JSONB,
            user_agent TEXT,
            ip_address TEXT,
            service_name TEXT,
            request_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create user_events table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ui_events (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT,
            session_id TEXT,
            interaction_type TEXT NOT NULL,
            element_type TEXT,
            element_name TEXT,
            element_id TEXT,
            page_path TEXT,
            page_context TEXT,
            route_name TEXT,
            event_value TEXT,
            event_metadata JSONB,
            user_agent TEXT,
            viewport_width INTEGER,
            viewport_height INTEGER,
            device_type TEXT,
            time_to_interaction_ms INTEGER,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create ui_events table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ui_errors (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT,
            session_id TEXT,
            error_message TEXT NOT NULL,
            error_type TEXT,
            error_stack TEXT,
            error_source TEXT,
            line_number INTEGER,
            column_number INTEGER,
            page_path TEXT,
            page_context TEXT,
            route_name TEXT,
            error_metadata JSONB,
            user_agent TEXT,
            viewport_width INTEGER,
            viewport_height INTEGER,
            device_type TEXT,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create ui_errors table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_errors (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT,
            session_id TEXT,
            error_message TEXT NOT NULL,
            error_type TEXT,
            status_code INTEGER,
            severity TEXT NOT NULL DEFAULT 'ERROR',
            request_url TEXT,
            request_method TEXT,
            request_headers JSONB,
            request_body TEXT,
            response_body TEXT,
            response_headers JSONB,
            service_name TEXT,
            endpoint TEXT,
            request_id TEXT,
            error_code TEXT,
            timeout_ms INTEGER,
            stack_trace TEXT,
            error_metadata JSONB,
            user_agent TEXT,
            ip_address TEXT,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create service_errors table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recorded_sessions (
            id BIGSERIAL PRIMARY KEY,
            name TEXT,
            started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ended_at TIMESTAMPTZ,
            duration_seconds INTEGER,
            notes TEXT,
            session_metadata JSONB
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create recorded_sessions table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            id TEXT PRIMARY KEY,
            user_id BIGINT,
            started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ended_at TIMESTAMPTZ,
            duration_seconds INTEGER,
            page_views INTEGER NOT NULL DEFAULT 0,
            events_count INTEGER NOT NULL DEFAULT 0,
            device_type TEXT,
            browser TEXT,
            os TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create user_sessions table")?;

    // Retention sweeps and list queries are timestamp-driven.
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_user_events_timestamp ON user_events(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_user_events_user ON user_events(user_id, timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_ui_events_timestamp ON ui_events(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_ui_events_page ON ui_events(page_path, element_type)",
        "CREATE INDEX IF NOT EXISTS idx_ui_errors_timestamp ON ui_errors(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_service_errors_timestamp ON service_errors(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_recorded_sessions_started ON recorded_sessions(started_at)",
    ] {
        sqlx::query(statement).execute(pool).await.context("Failed to create index")?;
    }

    Ok(())
}

/// Waits for CTRL+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received CTRL+C signal");
        },
        () = terminate => {
            info!("received SIGTERM signal");
        },
    }
}
