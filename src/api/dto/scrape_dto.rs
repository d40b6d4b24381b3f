//! DTOs for the scheduler-facing trigger and backfill endpoints.
//!
//! These bodies are consumed by the external scheduler and use camelCase
//! keys.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::GameSelection;
use crate::error::ServiceError;
use crate::service::{
    AttemptState, BackfillRange, BackfillReport, GameBackfill, GameReport, TriggerReport,
    TriggerRequest,
};

/// Date format accepted by `/scrape-range`.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Query string of `GET /scrape-trigger`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TriggerQuery {
    /// `4D`, `Lotto`, `Sweep` or `ALL` (default).
    #[serde(default)]
    pub game: Option<String>,
    /// Callbacks already made for today's draw. Defaults to 0.
    #[serde(default)]
    pub retry: Option<u32>,
    /// Run on non-draw days and accept draws dated another day.
    #[serde(default)]
    pub force: Option<bool>,
}

impl TriggerQuery {
    /// Converts the query into a service request.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidGame`] for an unknown game name.
    pub fn into_request(self) -> Result<TriggerRequest, ServiceError> {
        let selection = match self.game.as_deref() {
            None | Some("") => GameSelection::All,
            Some(name) => name.parse()?,
        };
        Ok(TriggerRequest {
            selection,
            retry_count: self.retry.unwrap_or(0),
            force: self.force.unwrap_or(false),
        })
    }
}

/// One game's entry in [`TriggerResponse`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameResultDto {
    /// Game wire name.
    pub game: String,
    /// Attempt outcome.
    pub state: AttemptState,
    /// Whether the state counts as success.
    pub success: bool,
    /// Human-readable detail.
    pub message: String,
    /// Draw number reconciled, when one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_number: Option<u32>,
}

impl From<GameReport> for GameResultDto {
    fn from(report: GameReport) -> Self {
        Self {
            game: report.game.as_wire_str().to_string(),
            state: report.state,
            success: report.state.is_success(),
            message: report.message,
            draw_number: report.draw_number,
        }
    }
}

/// Response body of `GET /scrape-trigger`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    /// Every game ended in a successful state.
    pub success: bool,
    /// At least one game wants another callback.
    pub needs_retry: bool,
    /// Retry count the run was called with.
    pub retry_count: u32,
    /// Retry bound in effect.
    pub max_retries: u32,
    /// Run correlation id.
    pub run_id: String,
    /// Per-game outcomes in run order.
    pub results: Vec<GameResultDto>,
}

impl From<TriggerReport> for TriggerResponse {
    fn from(report: TriggerReport) -> Self {
        Self {
            success: report.success(),
            needs_retry: report.needs_retry(),
            retry_count: report.retry_count,
            max_retries: report.max_retries,
            run_id: report.run_id.to_string(),
            results: report.results.into_iter().map(GameResultDto::from).collect(),
        }
    }
}

/// Query string of `GET /scrape-range`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct RangeQuery {
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day (inclusive), `YYYY-MM-DD`.
    pub end_date: String,
}

impl RangeQuery {
    /// Parses and validates the range.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRange`] if either date is malformed,
    /// the range is reversed, or it is too long.
    pub fn parse(&self) -> Result<BackfillRange, ServiceError> {
        let start = parse_query_date("startDate", &self.start_date)?;
        let end = parse_query_date("endDate", &self.end_date)?;
        Ok(BackfillRange::new(start, end)?)
    }
}

fn parse_query_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), QUERY_DATE_FORMAT).map_err(|_| {
        ServiceError::InvalidRange(format!("{field} must be YYYY-MM-DD, got {value:?}"))
    })
}

/// One game's counters in [`BackfillResponse`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameBackfillDto {
    /// Game wire name.
    pub game: String,
    /// Draws attempted.
    pub processed: u32,
    /// New rows.
    pub inserted: u32,
    /// Refreshed rows.
    pub updated: u32,
    /// Manual overrides and stale selections.
    pub skipped: u32,
    /// Draws that failed.
    pub failed: u32,
    /// Why the game could not be processed at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<GameBackfill> for GameBackfillDto {
    fn from(g: GameBackfill) -> Self {
        Self {
            game: g.game.as_wire_str().to_string(),
            processed: g.processed,
            inserted: g.inserted,
            updated: g.updated,
            skipped: g.skipped,
            failed: g.failed,
            error: g.error,
        }
    }
}

/// Response body of `GET /scrape-range`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    /// No draw failed and every game could be processed.
    pub success: bool,
    /// Run correlation id.
    pub run_id: String,
    /// Draws attempted, all games.
    pub processed: u32,
    /// New rows, all games.
    pub inserted: u32,
    /// Refreshed rows, all games.
    pub updated: u32,
    /// Skipped draws, all games.
    pub skipped: u32,
    /// Failed draws, all games.
    pub failed: u32,
    /// Per-game counters.
    pub games: Vec<GameBackfillDto>,
}

impl From<BackfillReport> for BackfillResponse {
    fn from(report: BackfillReport) -> Self {
        Self {
            success: report.success(),
            run_id: report.run_id.to_string(),
            processed: report.total(|g| g.processed),
            inserted: report.total(|g| g.inserted),
            updated: report.total(|g| g.updated),
            skipped: report.total(|g| g.skipped),
            failed: report.total(|g| g.failed),
            games: report.games.into_iter().map(GameBackfillDto::from).collect(),
        }
    }
}
