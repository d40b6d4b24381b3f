//! Validated draw records and their game-specific payloads.
//!
//! A [`DrawRecord`] only exists after the extractor's raw output passed
//! validation, so every field here is well-formed. Stored rows wrap the
//! record in a [`StoredDraw`] with source and timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::game::{DrawSource, GameType};

/// Number of starter prizes in a 4D draw.
pub const FOUR_D_STARTER_COUNT: usize = 10;
/// Number of consolation prizes in a 4D draw.
pub const FOUR_D_CONSOLATION_COUNT: usize = 10;
/// Number of jackpot prizes in a Sweep draw.
pub const SWEEP_JACKPOT_COUNT: usize = 10;
/// Number of lucky prizes in a Sweep draw.
pub const SWEEP_LUCKY_COUNT: usize = 10;
/// Number of gift prizes in a Sweep draw.
pub const SWEEP_GIFT_COUNT: usize = 10;
/// Number of consolation prizes in a Sweep draw.
pub const SWEEP_CONSOLATION_COUNT: usize = 30;

/// 4D result: three top prizes plus starter and consolation numbers.
///
/// Numbers are kept as strings so leading zeros survive (`"0427"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourDResult {
    /// First prize number.
    pub first_prize: String,
    /// Second prize number.
    pub second_prize: String,
    /// Third prize number.
    pub third_prize: String,
    /// Starter prize numbers in page order.
    pub starter: Vec<String>,
    /// Consolation prize numbers in page order.
    pub consolation: Vec<String>,
}

/// One row of the Lotto prize table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeGroup {
    /// Label as displayed (`"Group 1"`).
    pub group: String,
    /// Prize amount per winning share, in whole dollars. Figures shown
    /// with cents are rounded half up (`$10.50` is stored as 11).
    pub prize_amount: u64,
    /// Number of winning shares.
    pub winner_count: u32,
}

/// Lotto result: six winning numbers, the additional number and the prize table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LottoResult {
    /// The six primary numbers in draw order.
    pub winning_numbers: [u8; 6],
    /// Supplementary number; never one of `winning_numbers`.
    pub additional_number: u8,
    /// Prize tiers, top tier first.
    pub prize_groups: Vec<PrizeGroup>,
    /// Separately displayed jackpot figure in whole dollars, rounded
    /// like [`PrizeGroup::prize_amount`].
    #[serde(default)]
    pub jackpot: Option<u64>,
}

impl LottoResult {
    /// Returns the top-tier (Group 1) row.
    #[must_use]
    pub fn top_tier(&self) -> Option<&PrizeGroup> {
        self.prize_groups.first()
    }

    /// Whether the top tier had at least one winning share.
    #[must_use]
    pub fn has_top_tier_winner(&self) -> bool {
        self.top_tier().is_some_and(|g| g.winner_count > 0)
    }
}

/// Sweep result: three top prizes and four positional prize groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepResult {
    /// First prize ticket number.
    pub first_prize: String,
    /// Second prize ticket number.
    pub second_prize: String,
    /// Third prize ticket number.
    pub third_prize: String,
    /// Jackpot prize numbers.
    pub jackpot: Vec<String>,
    /// Lucky prize numbers.
    pub lucky: Vec<String>,
    /// Gift prize numbers.
    pub gift: Vec<String>,
    /// Consolation prize numbers.
    pub consolation: Vec<String>,
}

/// Game-specific payload, stored as the JSON `data` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game")]
pub enum DrawPayload {
    /// 4D payload.
    #[serde(rename = "4D")]
    FourD(FourDResult),
    /// Lotto payload.
    Lotto(LottoResult),
    /// Sweep payload.
    Sweep(SweepResult),
}

impl DrawPayload {
    /// Game type this payload belongs to.
    #[must_use]
    pub const fn game(&self) -> GameType {
        match self {
            Self::FourD(_) => GameType::FourD,
            Self::Lotto(_) => GameType::Lotto,
            Self::Sweep(_) => GameType::Sweep,
        }
    }
}

/// A validated draw, keyed by `(game, draw_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// Sequential draw number, always positive.
    pub draw_number: u32,
    /// Civil draw date in UTC+8.
    pub draw_date: NaiveDate,
    /// Game-specific data.
    pub payload: DrawPayload,
}

impl DrawRecord {
    /// Game type of the record.
    #[must_use]
    pub const fn game(&self) -> GameType {
        self.payload.game()
    }

    /// Lotto payload, when this is a Lotto draw.
    #[must_use]
    pub const fn as_lotto(&self) -> Option<&LottoResult> {
        match &self.payload {
            DrawPayload::Lotto(lotto) => Some(lotto),
            _ => None,
        }
    }
}

/// A draw record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDraw {
    /// The draw itself.
    #[serde(flatten)]
    pub record: DrawRecord,
    /// Who wrote the row.
    pub source: DrawSource,
    /// First write.
    pub created_at: DateTime<Utc>,
    /// Most recent write.
    pub updated_at: DateTime<Utc>,
}
