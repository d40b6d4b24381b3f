//! Administrative endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::RecalculateResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ServiceError};

/// `GET /admin/recalculate-cascade`: Rebuild the cascade status from
/// stored Lotto draws.
///
/// # Errors
///
/// Returns [`ServiceError::Storage`] if the store cannot be read or written.
#[utoipa::path(
    get,
    path = "/admin/recalculate-cascade",
    tag = "Admin",
    summary = "Recalculate cascade status",
    description = "Replays the most recent stored Lotto draws oldest first and overwrites the cascade status with the result.",
    responses(
        (status = 200, description = "Recomputed status", body = RecalculateResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn recalculate_cascade(
    State(state): State<AppState>,
) -> Result<Json<RecalculateResponse>, ServiceError> {
    let recalculation = state.cascade_service.recalculate().await?;
    Ok(Json(RecalculateResponse::from(recalculation)))
}

/// Admin routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/recalculate-cascade", get(recalculate_cascade))
}
