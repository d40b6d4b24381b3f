//! DTOs for the read-side and admin endpoints.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::schedule::format_draw_days;
use crate::domain::{CascadeStatus, GameType, ScheduleDefinition};
use crate::service::Recalculation;

const TIME_FORMAT: &str = "%H:%M";

/// Response body of `GET /admin/recalculate-cascade`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecalculateResponse {
    /// Always `true`; failures are reported as errors.
    pub success: bool,
    /// Status written to storage.
    pub cascade: CascadeStatus,
    /// Number of draws folded into the status.
    pub replayed: usize,
}

impl From<Recalculation> for RecalculateResponse {
    fn from(r: Recalculation) -> Self {
        Self {
            success: true,
            cascade: r.status,
            replayed: r.replayed,
        }
    }
}

/// Response body of `GET /api/v1/schedule/{game}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleResponse {
    /// Game the schedule applies to.
    pub game: GameType,
    /// Current date in the draw timezone.
    pub today: NaiveDate,
    /// Whether `today` is a draw day.
    pub is_draw_day: bool,
    /// Most recent draw date on or before today.
    pub most_recent_draw_date: Option<NaiveDate>,
    /// Next draw date on or after today.
    pub next_draw_date: Option<NaiveDate>,
    /// Weekdays, e.g. `"Mon,Thu"`.
    pub draw_days: String,
    /// Regular draw time, `HH:MM` UTC+8.
    pub draw_time: String,
    /// Draw time after applying the cascade flag.
    pub effective_draw_time: String,
    /// Cascade status; only present for Lotto.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadeStatus>,
}

impl ScheduleResponse {
    /// Evaluates `schedule` on `today`.
    #[must_use]
    pub fn evaluate(
        schedule: &ScheduleDefinition,
        today: NaiveDate,
        cascade: Option<CascadeStatus>,
    ) -> Self {
        let effective = schedule.effective_draw_time(cascade.as_ref());
        Self {
            game: schedule.game,
            today,
            is_draw_day: schedule.is_draw_day(today),
            most_recent_draw_date: schedule.most_recent_draw_date(today),
            next_draw_date: schedule.next_draw_date(today),
            draw_days: format_draw_days(&schedule.draw_days),
            draw_time: hh_mm(schedule.draw_time),
            effective_draw_time: hh_mm(effective),
            cascade,
        }
    }
}

fn hh_mm(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn tuesday_points_to_thursday_lotto_draw() {
        let schedule = ScheduleDefinition::default_for(GameType::Lotto);
        let response = ScheduleResponse::evaluate(&schedule, date(2026, 10, 13), None);
        assert!(!response.is_draw_day);
        assert_eq!(response.next_draw_date, Some(date(2026, 10, 15)));
        assert_eq!(response.most_recent_draw_date, Some(date(2026, 10, 12)));
        assert_eq!(response.draw_days, "Mon,Thu");
        assert_eq!(response.effective_draw_time, "18:30");
    }

    #[test]
    fn cascade_flag_moves_lotto_draw_time() {
        let schedule = ScheduleDefinition::default_for(GameType::Lotto);
        let mut status = CascadeStatus::reset(Utc::now());
        status.is_cascade_draw = true;
        let response = ScheduleResponse::evaluate(&schedule, date(2026, 10, 15), Some(status));
        assert!(response.is_draw_day);
        assert_eq!(response.draw_time, "18:30");
        assert_eq!(response.effective_draw_time, "21:30");
    }
}
