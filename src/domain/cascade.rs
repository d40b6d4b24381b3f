//! Consecutive no-winner streak for the Lotto top tier.
//!
//! [`CascadeStatus`] is the singleton that drives the "cascade draw"
//! indicator. Transitions are pure: [`CascadeStatus::advance`] folds one
//! draw into the status, and [`replay`] folds an ordered history from the
//! reset state. Persistence and locking live in the store; this module
//! only decides what the next state is.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Streak length at which the next draw is a cascade draw.
pub const DEFAULT_CASCADE_THRESHOLD: u32 = 3;

/// Persisted cascade indicator for the Lotto game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CascadeStatus {
    /// Number of most recent consecutive draws without a top-tier winner.
    pub consecutive_no_winner: u32,
    /// Whether the streak has reached the cascade threshold.
    pub is_cascade_draw: bool,
    /// Highest draw number already folded into the counter (0 = none).
    pub last_checked_draw_no: u32,
    /// Last time the row was written.
    pub updated_at: DateTime<Utc>,
}

impl CascadeStatus {
    /// The state before any draw has been processed.
    #[must_use]
    pub fn reset(now: DateTime<Utc>) -> Self {
        Self {
            consecutive_no_winner: 0,
            is_cascade_draw: false,
            last_checked_draw_no: 0,
            updated_at: now,
        }
    }

    /// Folds one draw into the status.
    ///
    /// Returns `None` when `draw_number` is not newer than
    /// `last_checked_draw_no`; the caller must then leave the stored row
    /// untouched. This makes repeated invocations for the same draw a
    /// no-op and keeps `last_checked_draw_no` monotonic.
    #[must_use]
    pub fn advance(
        &self,
        draw_number: u32,
        has_top_tier_winner: bool,
        threshold: u32,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if draw_number <= self.last_checked_draw_no {
            return None;
        }
        let consecutive_no_winner = if has_top_tier_winner {
            0
        } else {
            self.consecutive_no_winner.saturating_add(1)
        };
        Some(Self {
            consecutive_no_winner,
            is_cascade_draw: consecutive_no_winner >= threshold,
            last_checked_draw_no: draw_number,
            updated_at: now,
        })
    }
}

/// A draw reduced to what the cascade transition needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeInput {
    /// Draw number.
    pub draw_number: u32,
    /// Whether Group 1 had at least one winning share.
    pub has_top_tier_winner: bool,
}

/// Recomputes the status from scratch over `draws`, oldest first.
///
/// Draws are sorted by number before folding, so the result only depends
/// on the set of draws given.
#[must_use]
pub fn replay(draws: &[CascadeInput], threshold: u32, now: DateTime<Utc>) -> CascadeStatus {
    let mut ordered = draws.to_vec();
    ordered.sort_by_key(|d| d.draw_number);
    ordered
        .iter()
        .fold(CascadeStatus::reset(now), |status, draw| {
            status
                .advance(draw.draw_number, draw.has_top_tier_winner, threshold, now)
                .unwrap_or(status)
        })
}
