//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Read-side endpoints are mounted under `/api/v1`. The scheduler-facing
//! scrape endpoints, admin endpoints and `/health` live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[cfg(feature = "swagger-ui")]
#[derive(Debug, utoipa::OpenApi)]
#[openapi(
    info(title = "draw-sync", description = "Lottery draw result scraping and lookup"),
    paths(
        handlers::scrape::scrape_trigger,
        handlers::scrape::scrape_range,
        handlers::admin::recalculate_cascade,
        handlers::results::latest_result,
        handlers::results::schedule,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::TriggerResponse,
        dto::GameResultDto,
        dto::BackfillResponse,
        dto::GameBackfillDto,
        dto::RecalculateResponse,
        dto::ScheduleResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Scrape", description = "Scheduler-facing scrape runs"),
        (name = "Admin", description = "Maintenance operations"),
        (name = "Results", description = "Stored draws and schedules"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::scrape::routes())
        .merge(handlers::admin::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
    };

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppConfig;
    use crate::domain::ScheduleBook;
    use crate::persistence::MemoryStore;
    use crate::scrape::{FetchError, FetchSession, FetcherLauncher};
    use crate::service::NoopInvalidator;
    use crate::service::reconciler::tests::lotto_record;

    #[derive(Debug)]
    struct NoBrowser;

    #[async_trait]
    impl FetcherLauncher for NoBrowser {
        async fn launch(&self) -> Result<Box<dyn FetchSession>, FetchError> {
            Err(FetchError::Launch("no browser in tests".to_string()))
        }
    }

    fn app(store: Arc<MemoryStore>) -> Router {
        let state = AppState::assemble(
            &AppConfig::default(),
            store,
            Arc::new(NoBrowser),
            Arc::new(NoopInvalidator),
            ScheduleBook::default(),
        );
        build_router().with_state(state)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (status, body) = get(app(Arc::new(MemoryStore::new())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_game_is_a_bad_request() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = get(app(Arc::clone(&store)), "/api/v1/results/keno/latest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1002);

        let (status, _) = get(app(store), "/scrape-trigger?game=keno").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn latest_result_returns_stored_draw() {
        let store = Arc::new(MemoryStore::new());
        let (status, _) = get(app(Arc::clone(&store)), "/api/v1/results/Lotto/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let date = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap_or_default();
        store.insert_manual(lotto_record(4100, date, 0)).await;
        let (status, body) = get(app(store), "/api/v1/results/lotto/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draw_number"], 4100);
        assert_eq!(body["source"], "manual");
    }

    #[tokio::test]
    async fn schedule_includes_cascade_for_lotto_only() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = get(app(Arc::clone(&store)), "/api/v1/schedule/Lotto").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cascade"]["is_cascade_draw"], false);

        let (status, body) = get(app(store), "/api/v1/schedule/4D").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("cascade").is_none());
        assert_eq!(body["draw_days"], "Wed,Sat,Sun");
    }

    #[tokio::test]
    async fn malformed_query_values_get_json_errors() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = get(app(Arc::clone(&store)), "/scrape-trigger?retry=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);

        let (status, body) = get(app(Arc::clone(&store)), "/scrape-trigger?force=maybe").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);

        let (status, body) = get(app(store), "/scrape-range?startDate=2026-10-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);
    }

    #[tokio::test]
    async fn malformed_range_is_rejected() {
        let (status, body) = get(
            app(Arc::new(MemoryStore::new())),
            "/scrape-range?startDate=2026-10-01&endDate=yesterday",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1003);
    }

    #[tokio::test]
    async fn launch_failure_reports_retry_pending() {
        let (status, body) = get(
            app(Arc::new(MemoryStore::new())),
            "/scrape-trigger?game=4D&retry=0&force=true",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["needsRetry"], true);
        assert_eq!(body["results"][0]["game"], "4D");
    }

    #[tokio::test]
    async fn recalculate_on_empty_store_resets_status() {
        let (status, body) = get(
            app(Arc::new(MemoryStore::new())),
            "/admin/recalculate-cascade",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["replayed"], 0);
        assert_eq!(body["cascade"]["consecutive_no_winner"], 0);
    }
}
