//! Scheduler-facing scrape endpoints: trigger and range backfill.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{BackfillResponse, RangeQuery, TriggerQuery, TriggerResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ServiceError};

/// `GET /scrape-trigger`: Scrape the latest draw for one or all games.
///
/// Expected outcomes (not a draw day, not yet published, given up) come
/// back as 200 with per-game states; the scheduler reads `needsRetry`.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] for a malformed query string
/// and [`ServiceError::InvalidGame`] for an unknown `game`.
#[utoipa::path(
    get,
    path = "/scrape-trigger",
    tag = "Scrape",
    summary = "Scrape latest draws",
    description = "Fetches the latest result page for the selected game types, validates and reconciles the displayed draw, and reports whether the scheduler should call again.",
    params(TriggerQuery),
    responses(
        (status = 200, description = "Run report", body = TriggerResponse),
        (status = 400, description = "Malformed query or unknown game type", body = ErrorResponse),
    )
)]
pub async fn scrape_trigger(
    State(state): State<AppState>,
    query: Result<Query<TriggerQuery>, QueryRejection>,
) -> Result<Json<TriggerResponse>, ServiceError> {
    let Query(query) = query?;
    let request = query.into_request()?;
    let report = state.scrape_service.trigger(request).await;
    Ok(Json(TriggerResponse::from(report)))
}

/// `GET /scrape-range`: Backfill every game over a date range.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] when a date parameter is
/// missing and [`ServiceError::InvalidRange`] when the dates are malformed,
/// reversed, or span too many days.
#[utoipa::path(
    get,
    path = "/scrape-range",
    tag = "Scrape",
    summary = "Backfill a date range",
    description = "Selects each historical draw in the range from the result page draw picker, oldest first, and reconciles it. Manual rows are never overwritten.",
    params(RangeQuery),
    responses(
        (status = 200, description = "Backfill report", body = BackfillResponse),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
    )
)]
pub async fn scrape_range(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<BackfillResponse>, ServiceError> {
    let Query(query) = query?;
    let range = query.parse()?;
    let report = state.scrape_service.backfill(range).await;
    Ok(Json(BackfillResponse::from(report)))
}

/// Scrape routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scrape-trigger", get(scrape_trigger))
        .route("/scrape-range", get(scrape_range))
}
