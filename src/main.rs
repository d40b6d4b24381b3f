//! draw-sync server entry point.
//!
//! Starts the Axum HTTP server with the scrape, admin and lookup endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use draw_sync::api;
use draw_sync::app_state::AppState;
use draw_sync::config::{AppConfig, LogFormat};
use draw_sync::domain::ScheduleBook;
use draw_sync::persistence::{MemoryStore, PostgresStore, ResultStore};
use draw_sync::scrape::ChromeLauncher;
use draw_sync::service::{CacheInvalidator, HttpCacheInvalidator, NoopInvalidator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config =
        AppConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(addr = %config.listen_addr, "starting draw-sync");

    // Build persistence layer
    let store: Arc<dyn ResultStore> = if config.persistence_enabled {
        let pg = PostgresStore::connect(
            &config.database_url,
            config.database_max_connections,
            config.database_min_connections,
            Duration::from_secs(config.database_connect_timeout_secs),
        )
        .await
        .context("connecting to PostgreSQL")?;
        pg.migrate().await.context("running migrations")?;
        tracing::info!("persistence enabled");
        Arc::new(pg)
    } else {
        tracing::warn!("persistence disabled, results are kept in memory only");
        Arc::new(MemoryStore::new())
    };

    let schedules = match store.load_schedules().await {
        Ok(definitions) => ScheduleBook::from_definitions(definitions),
        Err(e) => {
            tracing::warn!(error = %e, "could not load schedules, using built-in defaults");
            ScheduleBook::default()
        }
    };

    let invalidator: Arc<dyn CacheInvalidator> = match &config.cache_purge_url {
        Some(url) => Arc::new(
            HttpCacheInvalidator::new(
                url.as_str(),
                config.cache_purge_token.clone(),
                Duration::from_secs(config.cache_purge_timeout_secs),
            )
            .context("building cache purge client")?,
        ),
        None => {
            tracing::info!("CACHE_PURGE_URL not set, cache purging disabled");
            Arc::new(NoopInvalidator)
        }
    };

    let launcher = Arc::new(ChromeLauncher::new(config.browser_settings()));

    // Build application state
    let app_state = AppState::assemble(&config, store, launcher, invalidator, schedules);
    tracing::info!(
        max_retries = app_state.scrape_service.max_retries(),
        cascade_threshold = config.cascade_threshold,
        "services ready"
    );

    // Build router
    let app = api::build_router()
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
