//! In-memory result store.
//!
//! Keeps rows in a `HashMap` behind a [`tokio::sync::RwLock`]. The cascade
//! singleton has its own lock, held for the whole read-modify-write in
//! [`ResultStore::advance_cascade`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta, Utc};
use tokio::sync::{Mutex, RwLock};

use super::{ResultStore, StoreError, UpsertOutcome};
use crate::domain::{
    CascadeInput, CascadeStatus, DrawRecord, DrawSource, GameType, ScheduleDefinition, StoredDraw,
};

/// Process-local store for tests and persistence-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    results: RwLock<HashMap<(GameType, u32), StoredDraw>>,
    cascade: Mutex<Option<CascadeStatus>>,
    schedules: RwLock<Vec<ScheduleDefinition>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that reports `schedules` from [`ResultStore::load_schedules`].
    #[must_use]
    pub fn with_schedules(schedules: Vec<ScheduleDefinition>) -> Self {
        Self {
            schedules: RwLock::new(schedules),
            ..Self::default()
        }
    }

    /// Writes a curated row, replacing whatever holds the key.
    pub async fn insert_manual(&self, record: DrawRecord) {
        let now = Utc::now();
        let key = (record.game(), record.draw_number);
        let mut map = self.results.write().await;
        let created_at = map.get(&key).map_or(now, |existing| existing.created_at);
        map.insert(
            key,
            StoredDraw {
                record,
                source: DrawSource::Manual,
                created_at,
                updated_at: now,
            },
        );
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    /// Returns `true` if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn find_draw(
        &self,
        game: GameType,
        draw_number: u32,
    ) -> Result<Option<StoredDraw>, StoreError> {
        Ok(self.results.read().await.get(&(game, draw_number)).cloned())
    }

    async fn latest_draw(&self, game: GameType) -> Result<Option<StoredDraw>, StoreError> {
        let map = self.results.read().await;
        Ok(map
            .values()
            .filter(|d| d.record.game() == game)
            .max_by_key(|d| d.record.draw_number)
            .cloned())
    }

    async fn exists_for_date(&self, game: GameType, date: NaiveDate) -> Result<bool, StoreError> {
        let map = self.results.read().await;
        Ok(map
            .values()
            .any(|d| d.record.game() == game && d.record.draw_date == date))
    }

    async fn upsert_scraped(&self, record: &DrawRecord) -> Result<UpsertOutcome, StoreError> {
        let now = Utc::now();
        let mut map = self.results.write().await;
        match map.get_mut(&(record.game(), record.draw_number)) {
            Some(existing) if existing.source == DrawSource::Manual => {
                Ok(UpsertOutcome::ManualOverride)
            }
            Some(existing) => {
                existing.record = record.clone();
                // Two writes within one clock tick still move the timestamp.
                existing.updated_at = now.max(existing.updated_at + TimeDelta::microseconds(1));
                Ok(UpsertOutcome::Updated)
            }
            None => {
                map.insert(
                    (record.game(), record.draw_number),
                    StoredDraw {
                        record: record.clone(),
                        source: DrawSource::Scrape,
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn recent_draws(
        &self,
        game: GameType,
        limit: u32,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let map = self.results.read().await;
        let mut draws: Vec<StoredDraw> = map
            .values()
            .filter(|d| d.record.game() == game)
            .cloned()
            .collect();
        draws.sort_by(|a, b| b.record.draw_number.cmp(&a.record.draw_number));
        draws.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(draws)
    }

    async fn load_cascade(&self) -> Result<CascadeStatus, StoreError> {
        Ok(self
            .cascade
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| CascadeStatus::reset(Utc::now())))
    }

    async fn advance_cascade(
        &self,
        input: CascadeInput,
        threshold: u32,
    ) -> Result<Option<CascadeStatus>, StoreError> {
        let now = Utc::now();
        let mut slot = self.cascade.lock().await;
        let current = slot.clone().unwrap_or_else(|| CascadeStatus::reset(now));
        let next = current.advance(input.draw_number, input.has_top_tier_winner, threshold, now);
        if let Some(next) = &next {
            *slot = Some(next.clone());
        }
        Ok(next)
    }

    async fn replace_cascade(&self, status: &CascadeStatus) -> Result<(), StoreError> {
        *self.cascade.lock().await = Some(status.clone());
        Ok(())
    }

    async fn load_schedules(&self) -> Result<Vec<ScheduleDefinition>, StoreError> {
        Ok(self.schedules.read().await.clone())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DrawPayload;
    use crate::domain::draw::FourDResult;

    fn four_d(draw_number: u32, first: &str) -> DrawRecord {
        DrawRecord {
            draw_number,
            draw_date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap_or_default(),
            payload: DrawPayload::FourD(FourDResult {
                first_prize: first.to_string(),
                second_prize: "2222".to_string(),
                third_prize: "3333".to_string(),
                starter: Vec::new(),
                consolation: Vec::new(),
            }),
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates() {
        let store = MemoryStore::new();
        assert_eq!(
            store.upsert_scraped(&four_d(5123, "1111")).await,
            Ok(UpsertOutcome::Inserted)
        );
        assert_eq!(
            store.upsert_scraped(&four_d(5123, "0427")).await,
            Ok(UpsertOutcome::Updated)
        );
        assert_eq!(store.len().await, 1);

        let Ok(Some(stored)) = store.find_draw(GameType::FourD, 5123).await else {
            panic!("row should exist");
        };
        assert_eq!(stored.record, four_d(5123, "0427"));
        assert_eq!(stored.source, DrawSource::Scrape);
    }

    #[tokio::test]
    async fn manual_rows_are_never_overwritten() {
        let store = MemoryStore::new();
        store.insert_manual(four_d(5123, "9999")).await;
        assert_eq!(
            store.upsert_scraped(&four_d(5123, "0427")).await,
            Ok(UpsertOutcome::ManualOverride)
        );
        let Ok(Some(stored)) = store.find_draw(GameType::FourD, 5123).await else {
            panic!("row should exist");
        };
        assert_eq!(stored.record, four_d(5123, "9999"));
    }

    #[tokio::test]
    async fn recent_draws_are_newest_first_and_limited() {
        let store = MemoryStore::new();
        for n in [10, 12, 11] {
            tokio_test::assert_ok!(store.upsert_scraped(&four_d(n, "0000")).await);
        }
        let Ok(recent) = store.recent_draws(GameType::FourD, 2).await else {
            panic!("read failed");
        };
        let numbers: Vec<u32> = recent.iter().map(|d| d.record.draw_number).collect();
        assert_eq!(numbers, vec![12, 11]);

        let Ok(Some(latest)) = store.latest_draw(GameType::FourD).await else {
            panic!("latest should exist");
        };
        assert_eq!(latest.record.draw_number, 12);
        assert!(matches!(store.latest_draw(GameType::Sweep).await, Ok(None)));
    }

    #[tokio::test]
    async fn cascade_advance_is_guarded_by_draw_number() {
        let store = MemoryStore::new();
        let input = CascadeInput {
            draw_number: 4100,
            has_top_tier_winner: false,
        };
        let Ok(Some(first)) = store.advance_cascade(input, 3).await else {
            panic!("first application should advance");
        };
        assert_eq!(first.consecutive_no_winner, 1);
        assert!(matches!(store.advance_cascade(input, 3).await, Ok(None)));

        let Ok(loaded) = store.load_cascade().await else {
            panic!("load failed");
        };
        assert_eq!(loaded, first);
    }
}
