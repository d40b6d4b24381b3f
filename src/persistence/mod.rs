//! Persistence layer: draw results, the cascade singleton and schedules.
//!
//! [`ResultStore`] is the one storage seam the services talk to. The
//! PostgreSQL implementation is used in production; [`MemoryStore`] backs
//! tests and runs with `PERSISTENCE_ENABLED=false`.
//!
//! Two guarantees every implementation must give:
//!
//! - [`ResultStore::upsert_scraped`] is a single atomic statement keyed by
//!   `(game, draw_number)` that never overwrites a `manual` row.
//! - [`ResultStore::advance_cascade`] reads and writes the singleton inside
//!   one exclusive section, so concurrent runs cannot lose an update.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    CascadeInput, CascadeStatus, DrawRecord, GameType, ScheduleDefinition, StoredDraw,
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The database rejected the statement or was unreachable.
    #[error("database error: {0}")]
    Database(String),
    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// What an upsert of scraped data did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed for the key.
    Inserted,
    /// A `scrape` row was overwritten.
    Updated,
    /// A `manual` row holds the key and was left untouched.
    ManualOverride,
}

/// Durable storage for results, cascade state and schedules.
#[async_trait]
pub trait ResultStore: Send + Sync + std::fmt::Debug {
    /// Looks up one draw.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn find_draw(
        &self,
        game: GameType,
        draw_number: u32,
    ) -> Result<Option<StoredDraw>, StoreError>;

    /// Draw with the highest number for `game`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn latest_draw(&self, game: GameType) -> Result<Option<StoredDraw>, StoreError>;

    /// Whether any row exists for `game` on `date`, whatever its source.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn exists_for_date(&self, game: GameType, date: NaiveDate) -> Result<bool, StoreError>;

    /// Inserts or refreshes a scraped record; `manual` rows always win.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn upsert_scraped(&self, record: &DrawRecord) -> Result<UpsertOutcome, StoreError>;

    /// Up to `limit` most recent draws of `game`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn recent_draws(&self, game: GameType, limit: u32)
    -> Result<Vec<StoredDraw>, StoreError>;

    /// Current cascade status; the reset state if none was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn load_cascade(&self) -> Result<CascadeStatus, StoreError>;

    /// Folds one draw into the cascade status under an exclusive lock.
    ///
    /// Returns the new status, or `None` if the draw was already counted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure; the status is unchanged.
    async fn advance_cascade(
        &self,
        input: CascadeInput,
        threshold: u32,
    ) -> Result<Option<CascadeStatus>, StoreError>;

    /// Overwrites the cascade status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    async fn replace_cascade(&self, status: &CascadeStatus) -> Result<(), StoreError>;

    /// Stored schedule definitions; games without a row are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure or an unreadable row.
    async fn load_schedules(&self) -> Result<Vec<ScheduleDefinition>, StoreError>;
}
