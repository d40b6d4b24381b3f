//! Read-side endpoints: latest stored draw and draw schedule per game.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::ScheduleResponse;
use crate::app_state::AppState;
use crate::domain::{GameType, StoredDraw};
use crate::error::{ErrorResponse, ServiceError};
use crate::scrape::dates::today_in_draw_tz;

/// `GET /results/{game}/latest`: Latest stored draw for a game.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidGame`] for an unknown game and
/// [`ServiceError::DrawNotFound`] when nothing is stored yet.
#[utoipa::path(
    get,
    path = "/api/v1/results/{game}/latest",
    tag = "Results",
    summary = "Latest stored draw",
    description = "Returns the stored draw with the highest draw number, whether scraped or entered manually.",
    params(
        ("game" = String, Path, description = "4D, Lotto or Sweep"),
    ),
    responses(
        (status = 200, description = "Stored draw", body = serde_json::Value),
        (status = 400, description = "Unknown game type", body = ErrorResponse),
        (status = 404, description = "No stored draw", body = ErrorResponse),
    )
)]
pub async fn latest_result(
    State(state): State<AppState>,
    Path(game): Path<String>,
) -> Result<Json<StoredDraw>, ServiceError> {
    let game: GameType = game.parse()?;
    let draw = state
        .store
        .latest_draw(game)
        .await?
        .ok_or_else(|| ServiceError::DrawNotFound(game.to_string()))?;
    Ok(Json(draw))
}

/// `GET /schedule/{game}`: Draw-day status and next draw for a game.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidGame`] for an unknown game and
/// [`ServiceError::Storage`] if the Lotto cascade status cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/schedule/{game}",
    tag = "Results",
    summary = "Draw schedule",
    description = "Evaluates the game's schedule on today's date in UTC+8. For Lotto the effective draw time follows the cascade flag.",
    params(
        ("game" = String, Path, description = "4D, Lotto or Sweep"),
    ),
    responses(
        (status = 200, description = "Schedule status", body = ScheduleResponse),
        (status = 400, description = "Unknown game type", body = ErrorResponse),
    )
)]
pub async fn schedule(
    State(state): State<AppState>,
    Path(game): Path<String>,
) -> Result<Json<ScheduleResponse>, ServiceError> {
    let game: GameType = game.parse()?;
    let cascade = if game.has_cascade() {
        Some(state.cascade_service.status().await?)
    } else {
        None
    };
    let definition = state.schedules.get(game);
    Ok(Json(ScheduleResponse::evaluate(
        &definition,
        today_in_draw_tz(),
        cascade,
    )))
}

/// Read-side routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/results/{game}/latest", get(latest_result))
        .route("/schedule/{game}", get(schedule))
}
