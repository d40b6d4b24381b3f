//! Service layer: orchestration of scrape runs on top of storage.
//!
//! [`ScrapeService`] drives fetch, extraction, validation and
//! reconciliation per game type; [`CascadeService`] owns the Lotto
//! cascade singleton; [`Reconciler`] is the only writer of scraped rows.

pub mod cascade_service;
pub mod invalidation;
pub mod reconciler;
pub mod retry;
pub mod scrape_service;

pub use cascade_service::{CascadeService, Recalculation};
pub use invalidation::{CacheInvalidator, HttpCacheInvalidator, NoopInvalidator};
pub use reconciler::{ReconcileError, ReconcileOutcome, Reconciler, SkipReason};
pub use retry::{AttemptState, Backoff, RetryPolicy};
pub use scrape_service::{
    BackfillRange, BackfillReport, GameBackfill, GameReport, RangeError, ScrapeService,
    ScrapeSettings, TriggerReport, TriggerRequest,
};
