//! PostgreSQL implementation of the result store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{CascadeRow, ResultRow, ScheduleRow, draw_number_column};
use super::{ResultStore, StoreError, UpsertOutcome};
use crate::domain::{
    CascadeInput, CascadeStatus, DrawRecord, DrawSource, GameType, ScheduleDefinition, StoredDraw,
};

type ResultTuple = (
    String,
    i32,
    NaiveDate,
    serde_json::Value,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

const RESULT_COLUMNS: &str =
    "draw_type, draw_number, draw_date, data, source, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if no connection can be established
    /// within `acquire_timeout`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn fetch_results(
        &self,
        sql: &str,
        game: GameType,
        arg: Option<i64>,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let mut query = sqlx::query_as::<_, ResultTuple>(sql).bind(game.as_db_str());
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(row_from_tuple)
            .map(StoredDraw::try_from)
            .collect()
    }
}

fn row_from_tuple(
    (draw_type, draw_number, draw_date, data, source, created_at, updated_at): ResultTuple,
) -> ResultRow {
    ResultRow {
        draw_type,
        draw_number,
        draw_date,
        data,
        source,
        created_at,
        updated_at,
    }
}

fn cascade_from_tuple(
    (consecutive_no_winner, is_cascade_draw, last_checked_draw_no, updated_at): (
        i32,
        bool,
        i32,
        DateTime<Utc>,
    ),
) -> Result<CascadeStatus, StoreError> {
    CascadeStatus::try_from(CascadeRow {
        consecutive_no_winner,
        is_cascade_draw,
        last_checked_draw_no,
        updated_at,
    })
}

fn counter_column(value: u32, column: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::Database(format!("{column} {value} exceeds column range")))
}

const WRITE_CASCADE: &str = "INSERT INTO toto_cascade_status \
     (id, consecutive_no_winner, is_cascade_draw, last_checked_draw_no, updated_at) \
     VALUES (1, $1, $2, $3, $4) \
     ON CONFLICT (id) DO UPDATE SET \
       consecutive_no_winner = EXCLUDED.consecutive_no_winner, \
       is_cascade_draw = EXCLUDED.is_cascade_draw, \
       last_checked_draw_no = EXCLUDED.last_checked_draw_no, \
       updated_at = EXCLUDED.updated_at";

#[async_trait]
impl ResultStore for PostgresStore {
    async fn find_draw(
        &self,
        game: GameType,
        draw_number: u32,
    ) -> Result<Option<StoredDraw>, StoreError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE draw_type = $1 AND draw_number = $2"
        );
        let rows = self
            .fetch_results(&sql, game, Some(i64::from(draw_number_column(draw_number)?)))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn latest_draw(&self, game: GameType) -> Result<Option<StoredDraw>, StoreError> {
        Ok(self.recent_draws(game, 1).await?.into_iter().next())
    }

    async fn exists_for_date(&self, game: GameType, date: NaiveDate) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM results WHERE draw_type = $1 AND draw_date = $2)",
        )
        .bind(game.as_db_str())
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn upsert_scraped(&self, record: &DrawRecord) -> Result<UpsertOutcome, StoreError> {
        let data = serde_json::to_value(&record.payload)
            .map_err(|e| StoreError::Database(format!("payload encoding: {e}")))?;

        // The WHERE on the update arm leaves manual rows alone; Postgres then
        // returns no row. `xmax = 0` only holds for freshly inserted tuples.
        let inserted = sqlx::query_scalar::<_, bool>(
            "INSERT INTO results (draw_type, draw_number, draw_date, data, source) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (draw_type, draw_number) DO UPDATE SET \
               data = EXCLUDED.data, draw_date = EXCLUDED.draw_date, updated_at = now() \
             WHERE results.source = $5 \
             RETURNING (xmax = 0)",
        )
        .bind(record.game().as_db_str())
        .bind(draw_number_column(record.draw_number)?)
        .bind(record.draw_date)
        .bind(data)
        .bind(DrawSource::Scrape.as_db_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(true) => UpsertOutcome::Inserted,
            Some(false) => UpsertOutcome::Updated,
            None => UpsertOutcome::ManualOverride,
        })
    }

    async fn recent_draws(
        &self,
        game: GameType,
        limit: u32,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE draw_type = $1 \
             ORDER BY draw_number DESC LIMIT $2"
        );
        self.fetch_results(&sql, game, Some(i64::from(limit))).await
    }

    async fn load_cascade(&self) -> Result<CascadeStatus, StoreError> {
        let row = sqlx::query_as::<_, (i32, bool, i32, DateTime<Utc>)>(
            "SELECT consecutive_no_winner, is_cascade_draw, last_checked_draw_no, updated_at \
             FROM toto_cascade_status WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map_or_else(|| Ok(CascadeStatus::reset(Utc::now())), cascade_from_tuple)
    }

    async fn advance_cascade(
        &self,
        input: CascadeInput,
        threshold: u32,
    ) -> Result<Option<CascadeStatus>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (i32, bool, i32, DateTime<Utc>)>(
            "SELECT consecutive_no_winner, is_cascade_draw, last_checked_draw_no, updated_at \
             FROM toto_cascade_status WHERE id = 1 FOR UPDATE",
        )
        .fetch_optional(&mut *tx)
        .await?;
        let now = Utc::now();
        let current = row.map_or_else(|| Ok(CascadeStatus::reset(now)), cascade_from_tuple)?;

        let Some(next) = current.advance(
            input.draw_number,
            input.has_top_tier_winner,
            threshold,
            now,
        ) else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(WRITE_CASCADE)
            .bind(counter_column(next.consecutive_no_winner, "consecutive_no_winner")?)
            .bind(next.is_cascade_draw)
            .bind(counter_column(next.last_checked_draw_no, "last_checked_draw_no")?)
            .bind(next.updated_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(next))
    }

    async fn replace_cascade(&self, status: &CascadeStatus) -> Result<(), StoreError> {
        sqlx::query(WRITE_CASCADE)
            .bind(counter_column(status.consecutive_no_winner, "consecutive_no_winner")?)
            .bind(status.is_cascade_draw)
            .bind(counter_column(status.last_checked_draw_no, "last_checked_draw_no")?)
            .bind(status.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_schedules(&self) -> Result<Vec<ScheduleDefinition>, StoreError> {
        let rows = sqlx::query_as::<
            _,
            (String, String, NaiveTime, Option<NaiveTime>, Option<String>),
        >(
            "SELECT game_type, draw_days, draw_time, cascade_draw_time, special_rule \
             FROM schedules ORDER BY game_type",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(game_type, draw_days, draw_time, cascade_draw_time, special_rule)| {
                    ScheduleDefinition::try_from(ScheduleRow {
                        game_type,
                        draw_days,
                        draw_time,
                        cascade_draw_time,
                        special_rule,
                    })
                },
            )
            .collect()
    }
}
