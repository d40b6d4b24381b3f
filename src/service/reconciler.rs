//! Merges validated draws into storage.
//!
//! Scraped data never overwrites a `manual` row. Inserts and updates purge
//! the affected cached pages; a failed purge is logged and otherwise
//! ignored.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::invalidation::CacheInvalidator;
use crate::domain::DrawRecord;
use crate::persistence::{ResultStore, StoreError, UpsertOutcome};

/// Why a record was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A curated row holds the key.
    ManualOverride,
    /// A historical selection still showed the previous draw.
    StaleSelection,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManualOverride => "manual override present",
            Self::StaleSelection => "selected draw did not load",
        })
    }
}

/// Result of reconciling one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new row was written.
    Inserted,
    /// An existing scraped row was refreshed.
    Updated,
    /// Nothing was written.
    Skipped(SkipReason),
}

impl ReconcileOutcome {
    /// Whether stored data changed.
    #[must_use]
    pub const fn wrote(self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => f.write_str("inserted"),
            Self::Updated => f.write_str("updated"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Reconciliation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The store rejected the write.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Writes validated records and purges caches.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Arc<dyn ResultStore>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl Reconciler {
    /// Creates a reconciler.
    #[must_use]
    pub fn new(store: Arc<dyn ResultStore>, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        Self { store, invalidator }
    }

    /// Upserts `record`, leaving manual rows untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Storage`] if the store fails.
    pub async fn reconcile(&self, record: &DrawRecord) -> Result<ReconcileOutcome, ReconcileError> {
        let game = record.game();
        let outcome = match self.store.upsert_scraped(record).await? {
            UpsertOutcome::Inserted => ReconcileOutcome::Inserted,
            UpsertOutcome::Updated => ReconcileOutcome::Updated,
            UpsertOutcome::ManualOverride => {
                tracing::info!(
                    game = %game,
                    draw_number = record.draw_number,
                    "manual override present, scraped draw not written"
                );
                return Ok(ReconcileOutcome::Skipped(SkipReason::ManualOverride));
            }
        };

        tracing::info!(
            game = %game,
            draw_number = record.draw_number,
            draw_date = %record.draw_date,
            outcome = %outcome,
            "draw reconciled"
        );

        if let Err(e) = self
            .invalidator
            .invalidate(game, Some(record.draw_date))
            .await
        {
            tracing::warn!(game = %game, error = %e, "cache invalidation failed");
        }
        Ok(outcome)
    }

    /// Like [`Self::reconcile`] for a draw picked from the history list.
    ///
    /// A record still carrying `previous_draw_number` means the selection
    /// did not take and the page shows the earlier draw; it is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Storage`] if the store fails.
    pub async fn reconcile_selected(
        &self,
        record: &DrawRecord,
        previous_draw_number: Option<u32>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if previous_draw_number == Some(record.draw_number) {
            tracing::warn!(
                game = %record.game(),
                draw_number = record.draw_number,
                "page still shows the previous draw after selection"
            );
            return Ok(ReconcileOutcome::Skipped(SkipReason::StaleSelection));
        }
        self.reconcile(record).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::draw::{LottoResult, PrizeGroup};
    use crate::domain::{DrawPayload, DrawSource, GameType};
    use crate::persistence::MemoryStore;
    use crate::service::invalidation::InvalidationError;

    /// Records every purge; optionally fails them.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingInvalidator {
        pub(crate) calls: Mutex<Vec<(GameType, Option<NaiveDate>)>>,
        pub(crate) fail: bool,
    }

    impl RecordingInvalidator {
        pub(crate) fn calls(&self) -> Vec<(GameType, Option<NaiveDate>)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl CacheInvalidator for RecordingInvalidator {
        async fn invalidate(
            &self,
            game: GameType,
            date: Option<NaiveDate>,
        ) -> Result<(), InvalidationError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((game, date));
            }
            if self.fail {
                return Err(InvalidationError::Client("purge endpoint down".to_string()));
            }
            Ok(())
        }
    }

    /// A valid Lotto draw.
    pub(crate) fn lotto_record(draw_number: u32, date: NaiveDate, top_winners: u32) -> DrawRecord {
        DrawRecord {
            draw_number,
            draw_date: date,
            payload: DrawPayload::Lotto(LottoResult {
                winning_numbers: [4, 9, 17, 22, 38, 45],
                additional_number: 30,
                prize_groups: vec![PrizeGroup {
                    group: "Group 1".to_string(),
                    prize_amount: 1_000_000,
                    winner_count: top_winners,
                }],
                jackpot: None,
            }),
        }
    }

    fn oct(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap_or_default()
    }

    fn setup(fail_purge: bool) -> (Arc<MemoryStore>, Arc<RecordingInvalidator>, Reconciler) {
        let store = Arc::new(MemoryStore::new());
        let invalidator = Arc::new(RecordingInvalidator {
            fail: fail_purge,
            ..RecordingInvalidator::default()
        });
        let reconciler = Reconciler::new(
            Arc::<MemoryStore>::clone(&store),
            Arc::<RecordingInvalidator>::clone(&invalidator),
        );
        (store, invalidator, reconciler)
    }

    #[tokio::test]
    async fn reconciling_twice_keeps_one_row() {
        let (store, invalidator, reconciler) = setup(false);
        let record = lotto_record(4100, oct(15), 1);

        assert_eq!(reconciler.reconcile(&record).await, Ok(ReconcileOutcome::Inserted));
        let Ok(Some(first)) = store.find_draw(GameType::Lotto, 4100).await else {
            panic!("row written");
        };

        assert_eq!(reconciler.reconcile(&record).await, Ok(ReconcileOutcome::Updated));
        let Ok(Some(second)) = store.find_draw(GameType::Lotto, 4100).await else {
            panic!("row kept");
        };
        assert_eq!(store.len().await, 1);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.record, first.record);
        assert_eq!(second.source, DrawSource::Scrape);
        assert_eq!(
            invalidator.calls(),
            vec![
                (GameType::Lotto, Some(oct(15))),
                (GameType::Lotto, Some(oct(15)))
            ]
        );
    }

    #[tokio::test]
    async fn manual_row_wins_and_skips_invalidation() {
        let (store, invalidator, reconciler) = setup(false);
        let curated = lotto_record(5000, oct(15), 2);
        store.insert_manual(curated.clone()).await;

        let scraped = lotto_record(5000, oct(15), 0);
        assert_eq!(
            reconciler.reconcile(&scraped).await,
            Ok(ReconcileOutcome::Skipped(SkipReason::ManualOverride))
        );

        let Ok(Some(stored)) = store.find_draw(GameType::Lotto, 5000).await else {
            panic!("manual row should remain");
        };
        assert_eq!(stored.source, DrawSource::Manual);
        assert_eq!(stored.record, curated);
        assert!(invalidator.calls().is_empty());
    }

    #[tokio::test]
    async fn purge_failure_does_not_fail_reconciliation() {
        let (store, invalidator, reconciler) = setup(true);
        let record = lotto_record(4101, oct(19), 0);
        assert_eq!(reconciler.reconcile(&record).await, Ok(ReconcileOutcome::Inserted));
        assert_eq!(invalidator.calls().len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn stale_selection_is_skipped() {
        let (store, _, reconciler) = setup(false);
        let record = lotto_record(4101, oct(19), 0);
        assert_eq!(
            reconciler.reconcile_selected(&record, Some(4101)).await,
            Ok(ReconcileOutcome::Skipped(SkipReason::StaleSelection))
        );
        assert!(store.is_empty().await);
        assert_eq!(
            reconciler.reconcile_selected(&record, Some(4102)).await,
            Ok(ReconcileOutcome::Inserted)
        );
    }
}
