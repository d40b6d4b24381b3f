//! Scrape runs: the scheduled trigger and the historical backfill.
//!
//! A run processes its game types one after another. The browser is
//! launched the first time a game needs a page and closed once at the end
//! of the run. Per-game failures end up in that game's report and never
//! abort the others.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::Instrument;

use super::cascade_service::CascadeService;
use super::reconciler::{ReconcileOutcome, Reconciler, SkipReason};
use super::retry::{AttemptState, Backoff, RetryPolicy, retry_transient};
use crate::domain::{DrawRecord, GameSelection, GameType, RunId, ScheduleBook};
use crate::persistence::ResultStore;
use crate::scrape::dates::today_in_draw_tz;
use crate::scrape::extract::{self, DrawOption, draw_options, draw_number_selector};
use crate::scrape::{FetchError, FetchRequest, FetchSession, FetcherLauncher, PageCatalog};

/// Longest backfill range accepted, in days.
pub const MAX_BACKFILL_DAYS: i64 = 366;

/// Knobs for scrape runs.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSettings {
    /// Where the result pages live.
    pub pages: PageCatalog,
    /// Bound on scheduler callbacks.
    pub retry: RetryPolicy,
    /// In-process backoff for transient navigation failures.
    pub backoff: Backoff,
}

/// Parameters of a trigger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRequest {
    /// Game types to process.
    pub selection: GameSelection,
    /// Callbacks already made for today's draw.
    pub retry_count: u32,
    /// Run even on non-draw days and accept a draw dated another day.
    pub force: bool,
}

/// One game's outcome in a trigger run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    /// Game processed.
    pub game: GameType,
    /// Attempt outcome.
    pub state: AttemptState,
    /// Human-readable detail.
    pub message: String,
    /// Draw number reconciled, when one was.
    pub draw_number: Option<u32>,
}

impl GameReport {
    fn new(game: GameType, state: AttemptState, message: impl Into<String>) -> Self {
        Self {
            game,
            state,
            message: message.into(),
            draw_number: None,
        }
    }
}

/// Result of a trigger run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerReport {
    /// Run correlation id.
    pub run_id: RunId,
    /// Retry count the run was called with.
    pub retry_count: u32,
    /// Retry bound in effect.
    pub max_retries: u32,
    /// Per-game outcomes in run order.
    pub results: Vec<GameReport>,
}

impl TriggerReport {
    /// Whether every game ended in a successful state.
    #[must_use]
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.state.is_success())
    }

    /// Whether any game asks for another callback.
    #[must_use]
    pub fn needs_retry(&self) -> bool {
        self.results.iter().any(|r| r.state.needs_retry())
    }
}

/// Rejected backfill range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// End precedes start.
    #[error("end date {end} is before start date {start}")]
    Reversed {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
    /// The range is longer than [`MAX_BACKFILL_DAYS`].
    #[error("range spans {days} days, at most {MAX_BACKFILL_DAYS} allowed")]
    TooLong {
        /// Requested span.
        days: i64,
    },
}

/// Inclusive date range for a backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl BackfillRange {
    /// Validates a range.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if `end < start` or the span is too long.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::Reversed { start, end });
        }
        let days = (end - start).num_days();
        if days > MAX_BACKFILL_DAYS {
            return Err(RangeError::TooLong { days });
        }
        Ok(Self { start, end })
    }

    /// Whether `date` falls in the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

/// Per-game backfill counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameBackfill {
    /// Game processed.
    pub game: GameType,
    /// Draws in range that were attempted.
    pub processed: u32,
    /// New rows.
    pub inserted: u32,
    /// Refreshed rows.
    pub updated: u32,
    /// Manual overrides and stale selections.
    pub skipped: u32,
    /// Draws that could not be fetched, validated or stored.
    pub failed: u32,
    /// Set when the whole game could not be processed.
    pub error: Option<String>,
}

impl GameBackfill {
    fn new(game: GameType) -> Self {
        Self {
            game,
            processed: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            error: None,
        }
    }

    fn count(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Inserted => self.inserted += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Result of a backfill run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Run correlation id.
    pub run_id: RunId,
    /// Per-game counters in run order.
    pub games: Vec<GameBackfill>,
}

impl BackfillReport {
    /// Sum of a counter over all games.
    #[must_use]
    pub fn total(&self, field: impl Fn(&GameBackfill) -> u32) -> u32 {
        self.games.iter().map(field).sum()
    }

    /// Whether no draw failed and every game could be processed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.games.iter().all(|g| g.failed == 0 && g.error.is_none())
    }
}

/// Orchestrates fetch, extract, validate, reconcile and cascade updates.
#[derive(Debug, Clone)]
pub struct ScrapeService {
    launcher: Arc<dyn FetcherLauncher>,
    store: Arc<dyn ResultStore>,
    reconciler: Reconciler,
    cascade: CascadeService,
    schedules: ScheduleBook,
    settings: ScrapeSettings,
}

impl ScrapeService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        launcher: Arc<dyn FetcherLauncher>,
        store: Arc<dyn ResultStore>,
        reconciler: Reconciler,
        cascade: CascadeService,
        schedules: ScheduleBook,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            launcher,
            store,
            reconciler,
            cascade,
            schedules,
            settings,
        }
    }

    /// Retry bound reported to the scheduler.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.settings.retry.max_retries()
    }

    /// Runs the trigger for today's date in the draw timezone.
    pub async fn trigger(&self, request: TriggerRequest) -> TriggerReport {
        self.trigger_on(request, today_in_draw_tz()).await
    }

    /// Runs the trigger as if the current draw-timezone date were `today`.
    pub async fn trigger_on(&self, request: TriggerRequest, today: NaiveDate) -> TriggerReport {
        let run_id = RunId::new();
        let span = tracing::info_span!(
            "scrape_run",
            run_id = %run_id,
            retry = request.retry_count,
            force = request.force,
            %today
        );

        async {
            tracing::info!("trigger run started");
            let mut session = LazySession::new(self.launcher.as_ref());
            let mut results = Vec::new();
            for game in request.selection.games() {
                let report = self
                    .attempt(game, request, today, &mut session)
                    .instrument(tracing::info_span!("game", game = %game))
                    .await;
                results.push(report);
            }
            session.close().await;

            let report = TriggerReport {
                run_id,
                retry_count: request.retry_count,
                max_retries: self.max_retries(),
                results,
            };
            tracing::info!(
                success = report.success(),
                needs_retry = report.needs_retry(),
                "trigger run finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn attempt(
        &self,
        game: GameType,
        request: TriggerRequest,
        today: NaiveDate,
        session: &mut LazySession<'_>,
    ) -> GameReport {
        let schedule = self.schedules.get(game);
        if !request.force && !schedule.is_draw_day(today) {
            tracing::debug!("not a draw day");
            return GameReport::new(game, AttemptState::NotDrawDay, "not a draw day");
        }

        match self.store.exists_for_date(game, today).await {
            Ok(true) => {
                tracing::info!("result already published");
                return GameReport::new(
                    game,
                    AttemptState::AlreadyPublished,
                    format!("result for {today} already stored"),
                );
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, "storage lookup failed");
                return GameReport::new(game, AttemptState::Failed, e.to_string());
            }
        }

        let record = match self.fetch_latest(game, session).await {
            Ok(Some(record)) => record,
            Ok(None) => return self.miss(game, request, "results not published yet"),
            Err(message) => return self.miss(game, request, message),
        };

        if record.draw_date != today {
            if !request.force {
                return self.miss(
                    game,
                    request,
                    format!(
                        "latest draw {} is dated {}, expected {today}",
                        record.draw_number, record.draw_date
                    ),
                );
            }
            tracing::info!(
                draw_number = record.draw_number,
                draw_date = %record.draw_date,
                "forced run accepting draw from another day"
            );
        }

        let outcome = match self.reconciler.reconcile(&record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(draw_number = record.draw_number, error = %e, "reconcile failed");
                return GameReport::new(game, AttemptState::Failed, e.to_string());
            }
        };

        if game.has_cascade()
            && let Err(e) = self.cascade.apply_stored(record.draw_number).await
        {
            tracing::error!(draw_number = record.draw_number, error = %e, "cascade update failed");
            return GameReport {
                draw_number: Some(record.draw_number),
                ..GameReport::new(
                    game,
                    AttemptState::Failed,
                    format!("draw {outcome}, cascade update failed: {e}"),
                )
            };
        }

        GameReport {
            draw_number: Some(record.draw_number),
            ..GameReport::new(
                game,
                AttemptState::Success,
                format!("draw {} {outcome}", record.draw_number),
            )
        }
    }

    /// Fetches and validates the latest draw. `Ok(None)` means no results
    /// node; `Err` carries a message for the report.
    async fn fetch_latest(
        &self,
        game: GameType,
        session: &mut LazySession<'_>,
    ) -> Result<Option<DrawRecord>, String> {
        let request = self.settings.pages.latest_request(game);
        let html = self
            .fetch_page(session, &request)
            .await
            .map_err(|e| format!("fetch failed: {e}"))?;
        let Some(raw) = extract::extract(game, &html) else {
            return Ok(None);
        };
        raw.validate()
            .map(Some)
            .map_err(|e| format!("invalid draw: {e}"))
    }

    async fn fetch_page(
        &self,
        session: &mut LazySession<'_>,
        request: &FetchRequest,
    ) -> Result<String, FetchError> {
        let session = session.get().await?;
        retry_transient(
            &self.settings.backoff,
            "fetch page",
            FetchError::is_transient,
            || session.fetch(request),
        )
        .await
    }

    fn miss(&self, game: GameType, request: TriggerRequest, message: impl Into<String>) -> GameReport {
        let message = message.into();
        let state = self.settings.retry.on_miss(request.retry_count);
        if state == AttemptState::GivenUp {
            tracing::error!(
                retry = request.retry_count,
                max_retries = self.max_retries(),
                reason = %message,
                "giving up on today's draw"
            );
        } else {
            tracing::warn!(retry = request.retry_count, reason = %message, "draw not available yet");
        }
        GameReport::new(game, state, message)
    }

    /// Re-scrapes every draw dated within `range`, for all game types,
    /// oldest first.
    pub async fn backfill(&self, range: BackfillRange) -> BackfillReport {
        let run_id = RunId::new();
        let span = tracing::info_span!(
            "backfill_run",
            run_id = %run_id,
            start = %range.start,
            end = %range.end
        );

        async {
            tracing::info!("backfill started");
            let mut session = LazySession::new(self.launcher.as_ref());
            let mut games = Vec::new();
            for game in GameType::ALL {
                let counters = self
                    .backfill_game(game, range, &mut session)
                    .instrument(tracing::info_span!("game", game = %game))
                    .await;
                games.push(counters);
            }
            session.close().await;

            let report = BackfillReport { run_id, games };
            tracing::info!(
                inserted = report.total(|g| g.inserted),
                updated = report.total(|g| g.updated),
                skipped = report.total(|g| g.skipped),
                failed = report.total(|g| g.failed),
                "backfill finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn backfill_game(
        &self,
        game: GameType,
        range: BackfillRange,
        session: &mut LazySession<'_>,
    ) -> GameBackfill {
        let mut counters = GameBackfill::new(game);
        let base = self.settings.pages.latest_request(game);
        let html = match self.fetch_page(session, &base).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(error = %e, "draw list unavailable");
                counters.error = Some(format!("fetch failed: {e}"));
                return counters;
            }
        };

        // Every selection starts from a freshly loaded page, which shows
        // this draw until the picker change lands.
        let displayed = extract::extract(game, &html).and_then(|raw| raw.validate().ok());
        let on_load = displayed.as_ref().map(|r| r.draw_number);

        let mut wanted: Vec<DrawOption> = draw_options(&html)
            .into_iter()
            .filter(|o| o.draw_date.is_some_and(|d| range.contains(d)))
            .collect();
        wanted.sort_by_key(|o| o.draw_date);
        tracing::info!(draws = wanted.len(), "draws in range");

        for option in wanted {
            counters.processed += 1;

            let shown = displayed
                .as_ref()
                .filter(|r| Some(r.draw_date) == option.draw_date);
            let (record, stale_guard) = if let Some(record) = shown {
                (record.clone(), None)
            } else {
                let request = base.clone().with_selection(
                    option.value.as_str(),
                    draw_number_selector(game),
                    on_load,
                );
                match self.fetch_selected(game, session, &request).await {
                    Ok(record) => (record, on_load),
                    Err(message) => {
                        tracing::warn!(option = %option.label, reason = %message, "draw skipped");
                        counters.failed += 1;
                        continue;
                    }
                }
            };

            if option.draw_date.is_some_and(|d| d != record.draw_date) {
                tracing::warn!(
                    option = %option.label,
                    draw_number = record.draw_number,
                    draw_date = %record.draw_date,
                    "selected draw did not load; discarding page"
                );
                counters.count(ReconcileOutcome::Skipped(SkipReason::StaleSelection));
                continue;
            }

            match self.reconciler.reconcile_selected(&record, stale_guard).await {
                Ok(outcome) => {
                    counters.count(outcome);
                    if game.has_cascade()
                        && let Err(e) = self.cascade.apply_stored(record.draw_number).await
                    {
                        tracing::error!(draw_number = record.draw_number, error = %e, "cascade update failed");
                    }
                }
                Err(e) => {
                    tracing::error!(draw_number = record.draw_number, error = %e, "reconcile failed");
                    counters.failed += 1;
                }
            }
        }
        counters
    }

    async fn fetch_selected(
        &self,
        game: GameType,
        session: &mut LazySession<'_>,
        request: &FetchRequest,
    ) -> Result<DrawRecord, String> {
        let html = self
            .fetch_page(session, request)
            .await
            .map_err(|e| format!("fetch failed: {e}"))?;
        let raw = extract::extract(game, &html).ok_or_else(|| "no results node".to_string())?;
        raw.validate().map_err(|e| format!("invalid draw: {e}"))
    }
}

enum SessionState {
    Idle,
    Open(Box<dyn FetchSession>),
    Failed(FetchError),
}

/// Browser session launched on first use and reused for the whole run.
struct LazySession<'a> {
    launcher: &'a dyn FetcherLauncher,
    state: SessionState,
}

impl<'a> LazySession<'a> {
    const fn new(launcher: &'a dyn FetcherLauncher) -> Self {
        Self {
            launcher,
            state: SessionState::Idle,
        }
    }

    /// Launches on first call. A failed launch is not retried within the run.
    async fn get(&mut self) -> Result<&dyn FetchSession, FetchError> {
        if matches!(self.state, SessionState::Idle) {
            self.state = match self.launcher.launch().await {
                Ok(session) => SessionState::Open(session),
                Err(e) => {
                    tracing::error!(error = %e, "browser launch failed");
                    SessionState::Failed(e)
                }
            };
        }
        match &self.state {
            SessionState::Open(session) => Ok(session.as_ref()),
            SessionState::Failed(e) => Err(e.clone()),
            SessionState::Idle => Err(FetchError::Launch("browser not started".to_string())),
        }
    }

    async fn close(self) {
        if let SessionState::Open(session) = self.state {
            session.close().await;
        }
    }
}
