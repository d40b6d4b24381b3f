//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::ScheduleBook;
use crate::persistence::ResultStore;
use crate::scrape::FetcherLauncher;
use crate::service::{CacheInvalidator, CascadeService, Reconciler, ScrapeService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Scrape runs: trigger and backfill.
    pub scrape_service: Arc<ScrapeService>,
    /// Cascade status and recalculation.
    pub cascade_service: Arc<CascadeService>,
    /// Read access to stored draws.
    pub store: Arc<dyn ResultStore>,
    /// Draw schedules.
    pub schedules: Arc<ScheduleBook>,
}

impl AppState {
    /// Wires the service layer on top of a store, a browser launcher and a
    /// cache invalidator.
    #[must_use]
    pub fn assemble(
        config: &AppConfig,
        store: Arc<dyn ResultStore>,
        launcher: Arc<dyn FetcherLauncher>,
        invalidator: Arc<dyn CacheInvalidator>,
        schedules: ScheduleBook,
    ) -> Self {
        let cascade = CascadeService::new(
            Arc::clone(&store),
            config.cascade_threshold,
            config.cascade_recalc_window,
        );
        let reconciler = Reconciler::new(Arc::clone(&store), invalidator);
        let scrape = ScrapeService::new(
            launcher,
            Arc::clone(&store),
            reconciler,
            cascade.clone(),
            schedules.clone(),
            config.scrape_settings(),
        );
        Self {
            scrape_service: Arc::new(scrape),
            cascade_service: Arc::new(cascade),
            store,
            schedules: Arc::new(schedules),
        }
    }
}
