//! # draw-sync
//!
//! Scrapes lottery draw results (4D, Lotto, Sweep) from script-rendered
//! result pages, reconciles them into PostgreSQL, and tracks the Lotto
//! cascade indicator that moves the next draw to its later time slot.
//!
//! An external scheduler calls `/scrape-trigger` after each draw time and
//! keeps calling back while the response says `needsRetry`. Historical
//! draws are backfilled through `/scrape-range`. Rows entered by hand are
//! never overwritten by a scrape.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler / clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ScrapeService, CascadeService, Reconciler (service/)
//!     │
//!     ├── Headless browser + extractors (scrape/)
//!     ├── Draw records, schedules, cascade rules (domain/)
//!     │
//!     └── ResultStore: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod scrape;
pub mod service;
