//! Database rows and their mapping to domain values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::StoreError;
use crate::domain::schedule::parse_draw_days;
use crate::domain::{
    CascadeStatus, DrawPayload, DrawRecord, DrawSource, GameType, ScheduleDefinition,
    SpecialRule, StoredDraw,
};

/// A row of the `results` table.
#[derive(Debug, Clone)]
pub struct ResultRow {
    /// `4D`, `LOTTO` or `SWEEP`.
    pub draw_type: String,
    /// Draw number.
    pub draw_number: i32,
    /// Civil draw date.
    pub draw_date: NaiveDate,
    /// Game-specific payload as JSONB.
    pub data: serde_json::Value,
    /// `scrape` or `manual`.
    pub source: String,
    /// First write.
    pub created_at: DateTime<Utc>,
    /// Most recent write.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for StoredDraw {
    type Error = StoreError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let game = GameType::from_db_str(&row.draw_type)
            .ok_or_else(|| StoreError::Corrupt(format!("draw_type {:?}", row.draw_type)))?;
        let source = DrawSource::from_db_str(&row.source)
            .ok_or_else(|| StoreError::Corrupt(format!("source {:?}", row.source)))?;
        let draw_number = u32::try_from(row.draw_number)
            .map_err(|_| StoreError::Corrupt(format!("draw_number {}", row.draw_number)))?;
        let payload: DrawPayload = serde_json::from_value(row.data).map_err(|e| {
            StoreError::Corrupt(format!("{game} draw {draw_number} payload: {e}"))
        })?;
        if payload.game() != game {
            return Err(StoreError::Corrupt(format!(
                "{game} draw {draw_number} carries a {} payload",
                payload.game()
            )));
        }
        Ok(Self {
            record: DrawRecord {
                draw_number,
                draw_date: row.draw_date,
                payload,
            },
            source,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// The `toto_cascade_status` singleton.
#[derive(Debug, Clone, Copy)]
pub struct CascadeRow {
    /// Streak counter.
    pub consecutive_no_winner: i32,
    /// Cascade flag.
    pub is_cascade_draw: bool,
    /// Last folded draw number.
    pub last_checked_draw_no: i32,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CascadeRow> for CascadeStatus {
    type Error = StoreError;

    fn try_from(row: CascadeRow) -> Result<Self, Self::Error> {
        let non_negative = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} {value}")))
        };
        Ok(Self {
            consecutive_no_winner: non_negative(row.consecutive_no_winner, "consecutive_no_winner")?,
            is_cascade_draw: row.is_cascade_draw,
            last_checked_draw_no: non_negative(row.last_checked_draw_no, "last_checked_draw_no")?,
            updated_at: row.updated_at,
        })
    }
}

/// A row of the `schedules` table.
#[derive(Debug, Clone)]
pub struct ScheduleRow {
    /// Game column value.
    pub game_type: String,
    /// Comma-separated weekday abbreviations.
    pub draw_days: String,
    /// Regular draw time.
    pub draw_time: NaiveTime,
    /// Draw time on cascade draws.
    pub cascade_draw_time: Option<NaiveTime>,
    /// Narrowing rule name.
    pub special_rule: Option<String>,
}

impl TryFrom<ScheduleRow> for ScheduleDefinition {
    type Error = StoreError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        let game = GameType::from_db_str(&row.game_type)
            .ok_or_else(|| StoreError::Corrupt(format!("game_type {:?}", row.game_type)))?;
        let draw_days = parse_draw_days(&row.draw_days)
            .map_err(|e| StoreError::Corrupt(format!("{game} schedule: {e}")))?;
        let special_rule = row
            .special_rule
            .as_deref()
            .map(str::parse::<SpecialRule>)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("{game} schedule: {e}")))?;
        Ok(Self {
            game,
            draw_days,
            draw_time: row.draw_time,
            cascade_draw_time: row.cascade_draw_time,
            special_rule,
        })
    }
}

/// Converts a draw number to the `INTEGER` column type.
pub(crate) fn draw_number_column(draw_number: u32) -> Result<i32, StoreError> {
    i32::try_from(draw_number)
        .map_err(|_| StoreError::Database(format!("draw number {draw_number} exceeds column range")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn result_row(draw_type: &str, data: serde_json::Value) -> ResultRow {
        ResultRow {
            draw_type: draw_type.to_string(),
            draw_number: 4100,
            draw_date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap_or_default(),
            data,
            source: "manual".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payload_must_match_draw_type() {
        let data = serde_json::json!({
            "game": "Lotto",
            "winning_numbers": [1, 2, 3, 4, 5, 6],
            "additional_number": 7,
            "prize_groups": [],
        });
        let Ok(stored) = StoredDraw::try_from(result_row("LOTTO", data.clone())) else {
            panic!("row should map");
        };
        assert_eq!(stored.source, DrawSource::Manual);
        assert_eq!(stored.record.game(), GameType::Lotto);

        assert!(matches!(
            StoredDraw::try_from(result_row("4D", data)),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn schedule_row_parses_days_and_rule() {
        let row = ScheduleRow {
            game_type: "SWEEP".to_string(),
            draw_days: "Wed".to_string(),
            draw_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or_default(),
            cascade_draw_time: None,
            special_rule: Some("first_weekday_of_month".to_string()),
        };
        let Ok(def) = ScheduleDefinition::try_from(row) else {
            panic!("row should map");
        };
        assert_eq!(def.draw_days, vec![Weekday::Wed]);
        assert_eq!(def.special_rule, Some(SpecialRule::FirstWeekdayOfMonth));
    }

    #[test]
    fn negative_counter_is_corrupt() {
        let row = CascadeRow {
            consecutive_no_winner: -1,
            is_cascade_draw: false,
            last_checked_draw_no: 0,
            updated_at: Utc::now(),
        };
        assert!(CascadeStatus::try_from(row).is_err());
    }
}
