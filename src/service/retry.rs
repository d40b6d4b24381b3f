//! Retry bookkeeping for draw-day polling, and in-process backoff for
//! transient browser failures.
//!
//! Two different retry loops live here:
//!
//! - [`RetryPolicy`] bounds how many times the external scheduler may call
//!   back while a result is not yet published. The retry count travels
//!   with each request; nothing is persisted.
//! - [`retry_transient`] re-runs a single navigation a few times with
//!   exponential backoff before giving up on it within one attempt.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Default polling window after the draw time, in minutes.
pub const DEFAULT_RETRY_WINDOW_MINUTES: u32 = 480;
/// Default spacing between scheduler callbacks, in minutes.
pub const DEFAULT_RETRY_INTERVAL_MINUTES: u32 = 5;

/// Bound on scheduler callbacks for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// How long to keep polling, in minutes.
    pub window_minutes: u32,
    /// Spacing between polls, in minutes.
    pub interval_minutes: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_RETRY_WINDOW_MINUTES,
            interval_minutes: DEFAULT_RETRY_INTERVAL_MINUTES,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; a zero interval is treated as one minute.
    #[must_use]
    pub const fn new(window_minutes: u32, interval_minutes: u32) -> Self {
        Self {
            window_minutes,
            interval_minutes,
        }
    }

    /// Number of callbacks that fit in the window.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        let interval = if self.interval_minutes == 0 {
            1
        } else {
            self.interval_minutes
        };
        self.window_minutes / interval
    }

    /// State to report when an attempt produced nothing usable.
    #[must_use]
    pub const fn on_miss(&self, retry_count: u32) -> AttemptState {
        if retry_count < self.max_retries() {
            AttemptState::RetryPending
        } else {
            AttemptState::GivenUp
        }
    }
}

/// Outcome of one game's attempt within a trigger run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// Today is not a draw day for the game.
    NotDrawDay,
    /// A row for today already exists.
    AlreadyPublished,
    /// The draw was fetched and reconciled.
    Success,
    /// Nothing usable yet; the scheduler should call again.
    RetryPending,
    /// Retries are exhausted for today.
    GivenUp,
    /// Storage failed while reconciling.
    Failed,
}

impl AttemptState {
    /// Whether the attempt counts as successful in the response.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            Self::NotDrawDay | Self::AlreadyPublished | Self::Success
        )
    }

    /// Whether the scheduler should schedule another callback.
    #[must_use]
    pub const fn needs_retry(self) -> bool {
        matches!(self, Self::RetryPending)
    }
}

/// Exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Growth factor between delays.
    pub multiplier: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::browser()
    }
}

impl Backoff {
    /// Settings for page navigation.
    #[must_use]
    pub const fn browser() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }

    /// No retries at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `operation`, retrying while `is_transient` says the error may go
/// away. Non-transient errors are returned immediately.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-transient error.
pub async fn retry_transient<T, E, F, Fut>(
    backoff: &Backoff,
    operation_name: &str,
    is_transient: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation = operation_name, retries = attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < backoff.max_retries && is_transient(&e) => {
                let delay = backoff.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    error = %e,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
