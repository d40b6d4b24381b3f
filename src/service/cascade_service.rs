//! Lotto cascade bookkeeping on top of the store.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::cascade::{self, DEFAULT_CASCADE_THRESHOLD};
use crate::domain::{CascadeInput, CascadeStatus, DrawRecord, GameType};
use crate::persistence::{ResultStore, StoreError};

/// Default number of recent draws replayed by a recalculation.
pub const DEFAULT_RECALC_WINDOW: u32 = 50;

/// Outcome of a full recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Recalculation {
    /// Status written to the store.
    pub status: CascadeStatus,
    /// Number of draws folded.
    pub replayed: usize,
}

/// Applies Lotto draws to the cascade singleton.
#[derive(Debug, Clone)]
pub struct CascadeService {
    store: Arc<dyn ResultStore>,
    threshold: u32,
    recalc_window: u32,
}

impl CascadeService {
    /// Creates a service with the given threshold and replay window.
    #[must_use]
    pub fn new(store: Arc<dyn ResultStore>, threshold: u32, recalc_window: u32) -> Self {
        Self {
            store,
            threshold,
            recalc_window,
        }
    }

    /// Creates a service with default settings.
    #[must_use]
    pub fn with_defaults(store: Arc<dyn ResultStore>) -> Self {
        Self::new(store, DEFAULT_CASCADE_THRESHOLD, DEFAULT_RECALC_WINDOW)
    }

    /// Current status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    pub async fn status(&self) -> Result<CascadeStatus, StoreError> {
        self.store.load_cascade().await
    }

    /// Folds a Lotto draw into the status; other games are ignored.
    ///
    /// Returns the new status, or `None` if nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    pub async fn apply(&self, record: &DrawRecord) -> Result<Option<CascadeStatus>, StoreError> {
        let Some(lotto) = record.as_lotto() else {
            return Ok(None);
        };
        let input = CascadeInput {
            draw_number: record.draw_number,
            has_top_tier_winner: lotto.has_top_tier_winner(),
        };
        let next = self.store.advance_cascade(input, self.threshold).await?;
        match &next {
            Some(status) => tracing::info!(
                draw_number = record.draw_number,
                consecutive_no_winner = status.consecutive_no_winner,
                is_cascade_draw = status.is_cascade_draw,
                "cascade status advanced"
            ),
            None => tracing::debug!(
                draw_number = record.draw_number,
                "draw already counted for cascade"
            ),
        }
        Ok(next)
    }

    /// Applies whatever is stored for Lotto draw `draw_number`.
    ///
    /// The stored row may be a manual one that a scrape did not overwrite;
    /// either way it is the authoritative draw.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    pub async fn apply_stored(&self, draw_number: u32) -> Result<Option<CascadeStatus>, StoreError> {
        match self.store.find_draw(GameType::Lotto, draw_number).await? {
            Some(stored) => self.apply(&stored.record).await,
            None => Ok(None),
        }
    }

    /// Rebuilds the status from the most recent Lotto draws and overwrites it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failure.
    pub async fn recalculate(&self) -> Result<Recalculation, StoreError> {
        let draws = self
            .store
            .recent_draws(GameType::Lotto, self.recalc_window)
            .await?;
        let inputs: Vec<CascadeInput> = draws
            .iter()
            .filter_map(|d| {
                d.record.as_lotto().map(|lotto| CascadeInput {
                    draw_number: d.record.draw_number,
                    has_top_tier_winner: lotto.has_top_tier_winner(),
                })
            })
            .collect();

        let status = cascade::replay(&inputs, self.threshold, Utc::now());
        self.store.replace_cascade(&status).await?;
        tracing::info!(
            replayed = inputs.len(),
            consecutive_no_winner = status.consecutive_no_winner,
            is_cascade_draw = status.is_cascade_draw,
            "cascade status recalculated"
        );
        Ok(Recalculation {
            status,
            replayed: inputs.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::persistence::MemoryStore;
    use crate::service::reconciler::tests::lotto_record;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap_or_default()
    }

    fn service(store: &Arc<MemoryStore>) -> CascadeService {
        CascadeService::new(Arc::<MemoryStore>::clone(store), 3, 50)
    }

    #[tokio::test]
    async fn three_misses_make_a_cascade_draw() {
        let store = Arc::new(MemoryStore::new());
        let cascade = service(&store);
        for n in 4100..4103 {
            tokio_test::assert_ok!(cascade.apply(&lotto_record(n, date(), 0)).await);
        }
        let Ok(status) = cascade.status().await else {
            panic!("load failed");
        };
        assert_eq!(status.consecutive_no_winner, 3);
        assert!(status.is_cascade_draw);
        assert_eq!(status.last_checked_draw_no, 4102);

        let Ok(Some(after_win)) = cascade.apply(&lotto_record(4103, date(), 1)).await else {
            panic!("winner should advance");
        };
        assert_eq!(after_win.consecutive_no_winner, 0);
        assert!(!after_win.is_cascade_draw);
    }

    #[tokio::test]
    async fn reapplying_a_draw_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let cascade = service(&store);
        let record = lotto_record(4100, date(), 0);
        assert!(matches!(cascade.apply(&record).await, Ok(Some(_))));
        assert!(matches!(cascade.apply(&record).await, Ok(None)));
        let Ok(status) = cascade.status().await else {
            panic!("load failed");
        };
        assert_eq!(status.consecutive_no_winner, 1);
    }

    #[tokio::test]
    async fn recalculation_matches_incremental_application() {
        let store = Arc::new(MemoryStore::new());
        let cascade = service(&store);
        let winners = [0, 0, 2, 0, 0, 0, 0];
        for (offset, w) in (0u32..).zip(winners) {
            let record = lotto_record(4200 + offset, date(), w);
            tokio_test::assert_ok!(store.upsert_scraped(&record).await);
            tokio_test::assert_ok!(cascade.apply_stored(record.draw_number).await);
        }
        let Ok(incremental) = cascade.status().await else {
            panic!("load failed");
        };

        store.replace_cascade(&CascadeStatus::reset(Utc::now())).await.ok();
        let Ok(recalc) = cascade.recalculate().await else {
            panic!("recalculation failed");
        };
        assert_eq!(recalc.replayed, 7);
        assert_eq!(recalc.status.consecutive_no_winner, incremental.consecutive_no_winner);
        assert_eq!(recalc.status.is_cascade_draw, incremental.is_cascade_draw);
        assert_eq!(recalc.status.last_checked_draw_no, incremental.last_checked_draw_no);
        assert_eq!(recalc.status.consecutive_no_winner, 4);
    }

    #[tokio::test]
    async fn stored_manual_row_drives_the_counter() {
        let store = Arc::new(MemoryStore::new());
        let cascade = service(&store);
        store.insert_manual(lotto_record(5000, date(), 1)).await;
        // The scraper saw no winner, but the curated row says otherwise.
        tokio_test::assert_ok!(store.upsert_scraped(&lotto_record(5000, date(), 0)).await);
        let Ok(Some(status)) = cascade.apply_stored(5000).await else {
            panic!("stored row should apply");
        };
        assert_eq!(status.consecutive_no_winner, 0);
    }
}
