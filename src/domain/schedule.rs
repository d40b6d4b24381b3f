//! Draw schedules and the draw-day predicate.
//!
//! A [`ScheduleDefinition`] says on which weekdays a game draws, at what
//! time (UTC+8), and whether a special rule narrows the weekday set. The
//! scans for the most recent and next draw date are linear and bounded to
//! [`SCAN_LIMIT_DAYS`]; they return `None` instead of failing when
//! nothing matches inside the bound.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use super::cascade::CascadeStatus;
use super::game::GameType;

/// Maximum number of days the draw-date scans look backward or forward.
pub const SCAN_LIMIT_DAYS: u64 = 31;

/// Modifier that narrows the weekday rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialRule {
    /// Only the first occurrence of a listed weekday within its month.
    FirstWeekdayOfMonth,
}

impl SpecialRule {
    /// Value stored in `schedules.special_rule`.
    #[must_use]
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::FirstWeekdayOfMonth => "first_weekday_of_month",
        }
    }
}

impl fmt::Display for SpecialRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Error returned for unrecognised schedule column values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleParseError {
    /// Unknown special rule name.
    #[error("unknown special rule: {0}")]
    SpecialRule(String),
    /// Unknown weekday name.
    #[error("unknown weekday: {0}")]
    Weekday(String),
}

impl FromStr for SpecialRule {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "first_weekday_of_month" | "firstWeekdayOfMonth" => Ok(Self::FirstWeekdayOfMonth),
            other => Err(ScheduleParseError::SpecialRule(other.to_string())),
        }
    }
}

/// Parses a comma-separated weekday list such as `"Mon,Thu"`.
///
/// # Errors
///
/// Returns [`ScheduleParseError::Weekday`] for any unrecognised entry.
pub fn parse_draw_days(value: &str) -> Result<Vec<Weekday>, ScheduleParseError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Weekday>()
                .map_err(|_| ScheduleParseError::Weekday(s.to_string()))
        })
        .collect()
}

/// Formats weekdays back into the `"Mon,Thu"` column format.
#[must_use]
pub fn format_draw_days(days: &[Weekday]) -> String {
    days.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// When a game draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleDefinition {
    /// Game the schedule applies to.
    pub game: GameType,
    /// Weekdays on which a draw may happen.
    pub draw_days: Vec<Weekday>,
    /// Regular draw time, UTC+8.
    pub draw_time: NaiveTime,
    /// Later draw time used when the cascade flag is set.
    pub cascade_draw_time: Option<NaiveTime>,
    /// Optional narrowing rule.
    pub special_rule: Option<SpecialRule>,
}

impl ScheduleDefinition {
    /// Built-in schedule used when the `schedules` table has no row.
    #[must_use]
    pub fn default_for(game: GameType) -> Self {
        let half_past_six = NaiveTime::from_hms_opt(18, 30, 0).unwrap_or(NaiveTime::MIN);
        match game {
            GameType::FourD => Self {
                game,
                draw_days: vec![Weekday::Wed, Weekday::Sat, Weekday::Sun],
                draw_time: half_past_six,
                cascade_draw_time: None,
                special_rule: None,
            },
            GameType::Lotto => Self {
                game,
                draw_days: vec![Weekday::Mon, Weekday::Thu],
                draw_time: half_past_six,
                cascade_draw_time: NaiveTime::from_hms_opt(21, 30, 0),
                special_rule: None,
            },
            GameType::Sweep => Self {
                game,
                draw_days: vec![Weekday::Wed],
                draw_time: half_past_six,
                cascade_draw_time: None,
                special_rule: Some(SpecialRule::FirstWeekdayOfMonth),
            },
        }
    }

    /// Whether `date` is a draw day under this schedule.
    #[must_use]
    pub fn is_draw_day(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday();
        if !self.draw_days.contains(&weekday) {
            return false;
        }
        match self.special_rule {
            None => true,
            Some(SpecialRule::FirstWeekdayOfMonth) => {
                first_weekday_in_month(date.year(), date.month(), weekday) == Some(date)
            }
        }
    }

    /// Most recent draw date on or before `from`.
    ///
    /// Returns `None` if no draw day falls within [`SCAN_LIMIT_DAYS`].
    #[must_use]
    pub fn most_recent_draw_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        (0..=SCAN_LIMIT_DAYS)
            .filter_map(|offset| from.checked_sub_days(Days::new(offset)))
            .find(|date| self.is_draw_day(*date))
    }

    /// Next draw date on or after `from`.
    ///
    /// Returns `None` if no draw day falls within [`SCAN_LIMIT_DAYS`].
    #[must_use]
    pub fn next_draw_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        (0..=SCAN_LIMIT_DAYS)
            .filter_map(|offset| from.checked_add_days(Days::new(offset)))
            .find(|date| self.is_draw_day(*date))
    }

    /// Draw time to advertise given the current cascade state.
    #[must_use]
    pub fn effective_draw_time(&self, cascade: Option<&CascadeStatus>) -> NaiveTime {
        match (cascade, self.cascade_draw_time) {
            (Some(status), Some(cascade_time)) if status.is_cascade_draw => cascade_time,
            _ => self.draw_time,
        }
    }
}

/// First day of `year-month` that falls on `weekday`.
fn first_weekday_in_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    (1..=7)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| date.weekday() == weekday)
}

/// Schedules for every game, falling back to built-in defaults.
#[derive(Debug, Clone)]
pub struct ScheduleBook {
    schedules: HashMap<GameType, ScheduleDefinition>,
}

impl ScheduleBook {
    /// Builds a book from stored rows; games without a row use
    /// [`ScheduleDefinition::default_for`].
    #[must_use]
    pub fn from_definitions(definitions: Vec<ScheduleDefinition>) -> Self {
        let mut schedules: HashMap<GameType, ScheduleDefinition> = GameType::ALL
            .iter()
            .map(|g| (*g, ScheduleDefinition::default_for(*g)))
            .collect();
        for definition in definitions {
            schedules.insert(definition.game, definition);
        }
        Self { schedules }
    }

    /// Schedule for `game`.
    #[must_use]
    pub fn get(&self, game: GameType) -> ScheduleDefinition {
        self.schedules
            .get(&game)
            .cloned()
            .unwrap_or_else(|| ScheduleDefinition::default_for(game))
    }
}

impl Default for ScheduleBook {
    fn default() -> Self {
        Self::from_definitions(Vec::new())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("invalid test date {y}-{m}-{d}");
        };
        date
    }

    fn mon_thu() -> ScheduleDefinition {
        ScheduleDefinition {
            game: GameType::Lotto,
            draw_days: vec![Weekday::Mon, Weekday::Thu],
            draw_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or(NaiveTime::MIN),
            cascade_draw_time: NaiveTime::from_hms_opt(21, 30, 0),
            special_rule: None,
        }
    }

    #[test]
    fn weekday_membership() {
        let schedule = mon_thu();
        // 2026-10-19 is a Monday, 2026-10-20 a Tuesday.
        assert!(schedule.is_draw_day(date(2026, 10, 19)));
        assert!(!schedule.is_draw_day(date(2026, 10, 20)));
    }

    #[test]
    fn next_draw_from_tuesday_is_thursday() {
        let schedule = mon_thu();
        assert_eq!(
            schedule.next_draw_date(date(2026, 10, 20)),
            Some(date(2026, 10, 22))
        );
    }

    #[test]
    fn next_draw_from_friday_is_monday() {
        let schedule = mon_thu();
        assert_eq!(
            schedule.next_draw_date(date(2026, 10, 23)),
            Some(date(2026, 10, 26))
        );
    }

    #[test]
    fn most_recent_draw_includes_today() {
        let schedule = mon_thu();
        assert_eq!(
            schedule.most_recent_draw_date(date(2026, 10, 22)),
            Some(date(2026, 10, 22))
        );
        assert_eq!(
            schedule.most_recent_draw_date(date(2026, 10, 21)),
            Some(date(2026, 10, 19))
        );
    }

    #[test]
    fn first_weekday_rule_when_first_occurrence_is_day_seven() {
        // October 2026 starts on a Thursday, so its first Wednesday is the 7th.
        let sweep = ScheduleDefinition::default_for(GameType::Sweep);
        assert!(sweep.is_draw_day(date(2026, 10, 7)));
        assert!(!sweep.is_draw_day(date(2026, 10, 14)));
        assert!(!sweep.is_draw_day(date(2026, 10, 8)));
    }

    #[test]
    fn first_weekday_rule_on_day_one() {
        // July 2026 starts on a Wednesday.
        let sweep = ScheduleDefinition::default_for(GameType::Sweep);
        assert!(sweep.is_draw_day(date(2026, 7, 1)));
        assert!(!sweep.is_draw_day(date(2026, 7, 8)));
    }

    #[test]
    fn monthly_next_draw_crosses_month_boundary() {
        let sweep = ScheduleDefinition::default_for(GameType::Sweep);
        assert_eq!(
            sweep.next_draw_date(date(2026, 10, 8)),
            Some(date(2026, 11, 4))
        );
    }

    #[test]
    fn empty_weekday_set_yields_none_not_panic() {
        let mut schedule = mon_thu();
        schedule.draw_days.clear();
        assert_eq!(schedule.next_draw_date(date(2026, 10, 20)), None);
        assert_eq!(schedule.most_recent_draw_date(date(2026, 10, 20)), None);
    }

    #[test]
    fn cascade_moves_draw_time() {
        let schedule = mon_thu();
        let mut status = CascadeStatus::reset(Utc::now());
        assert_eq!(
            schedule.effective_draw_time(Some(&status)),
            schedule.draw_time
        );
        status.is_cascade_draw = true;
        assert_eq!(
            Some(schedule.effective_draw_time(Some(&status))),
            schedule.cascade_draw_time
        );
        assert_eq!(schedule.effective_draw_time(None), schedule.draw_time);
    }

    #[test]
    fn draw_days_column_round_trip() {
        let Ok(days) = parse_draw_days("Mon, Thu") else {
            panic!("draw days should parse");
        };
        assert_eq!(days, vec![Weekday::Mon, Weekday::Thu]);
        assert_eq!(format_draw_days(&days), "Mon,Thu");
        assert!(parse_draw_days("Mon,Funday").is_err());
    }

    #[test]
    fn book_prefers_stored_rows() {
        let mut custom = ScheduleDefinition::default_for(GameType::FourD);
        custom.draw_days = vec![Weekday::Fri];
        let book = ScheduleBook::from_definitions(vec![custom.clone()]);
        assert_eq!(book.get(GameType::FourD), custom);
        assert_eq!(
            book.get(GameType::Lotto),
            ScheduleDefinition::default_for(GameType::Lotto)
        );
    }
}
