//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod results;
pub mod scrape;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes the read-side routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().merge(results::routes())
}
