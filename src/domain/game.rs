//! Game type and record source discriminators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three published game types.
///
/// The wire names (`"4D"`, `"Lotto"`, `"Sweep"`) are what the external
/// scheduler passes in `?game=`; the database uses the upper-case column
/// values returned by [`GameType::as_db_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum GameType {
    /// Four-digit game with three top prizes, starters and consolations.
    #[serde(rename = "4D")]
    FourD,
    /// Six-of-49 game with an additional number and a cascading top tier.
    #[serde(rename = "Lotto")]
    Lotto,
    /// Monthly sweep with seven-digit ticket numbers.
    #[serde(rename = "Sweep")]
    Sweep,
}

impl GameType {
    /// Every game type, in the order a run processes them.
    pub const ALL: [Self; 3] = [Self::FourD, Self::Lotto, Self::Sweep];

    /// Value stored in the `results.draw_type` and `schedules.game_type` columns.
    #[must_use]
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::FourD => "4D",
            Self::Lotto => "LOTTO",
            Self::Sweep => "SWEEP",
        }
    }

    /// Name used in query strings and response bodies.
    #[must_use]
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            Self::FourD => "4D",
            Self::Lotto => "Lotto",
            Self::Sweep => "Sweep",
        }
    }

    /// URL path segment for the public pages of this game.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::FourD => "4d",
            Self::Lotto => "toto",
            Self::Sweep => "sweep",
        }
    }

    /// Whether this game carries the cascading top-tier prize.
    #[must_use]
    pub const fn has_cascade(self) -> bool {
        matches!(self, Self::Lotto)
    }

    /// Parses a database column value.
    #[must_use]
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "4D" => Some(Self::FourD),
            "LOTTO" => Some(Self::Lotto),
            "SWEEP" => Some(Self::Sweep),
            _ => None,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// Error returned when a game name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game type: {0}")]
pub struct UnknownGame(pub String);

impl FromStr for GameType {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4d" | "fourd" => Ok(Self::FourD),
            "lotto" | "toto" => Ok(Self::Lotto),
            "sweep" => Ok(Self::Sweep),
            _ => Err(UnknownGame(s.to_string())),
        }
    }
}

/// Game selector accepted by the trigger endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSelection {
    /// Run a single game type.
    One(GameType),
    /// Run every game type sequentially.
    All,
}

impl GameSelection {
    /// Expands the selection into the game types to process, in run order.
    #[must_use]
    pub fn games(self) -> Vec<GameType> {
        match self {
            Self::One(game) => vec![game],
            Self::All => GameType::ALL.to_vec(),
        }
    }
}

impl FromStr for GameSelection {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::One)
    }
}

/// Where a stored draw record came from.
///
/// Governs reconciliation precedence: a `Manual` row is never overwritten
/// by a scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawSource {
    /// Written by the scrape pipeline.
    Scrape,
    /// Entered by an administrator.
    Manual,
}

impl DrawSource {
    /// Value stored in the `results.source` column.
    #[must_use]
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Manual => "manual",
        }
    }

    /// Parses a database column value.
    #[must_use]
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "scrape" => Some(Self::Scrape),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!("4D".parse::<GameType>(), Ok(GameType::FourD));
        assert_eq!("lotto".parse::<GameType>(), Ok(GameType::Lotto));
        assert_eq!("TOTO".parse::<GameType>(), Ok(GameType::Lotto));
        assert_eq!("Sweep".parse::<GameType>(), Ok(GameType::Sweep));
        assert!("keno".parse::<GameType>().is_err());
    }

    #[test]
    fn selection_all_expands_in_run_order() {
        let Ok(selection) = "ALL".parse::<GameSelection>() else {
            panic!("ALL should parse");
        };
        assert_eq!(
            selection.games(),
            vec![GameType::FourD, GameType::Lotto, GameType::Sweep]
        );
    }

    #[test]
    fn db_values_round_trip() {
        for game in GameType::ALL {
            assert_eq!(GameType::from_db_str(game.as_db_str()), Some(game));
        }
        for source in [DrawSource::Scrape, DrawSource::Manual] {
            assert_eq!(DrawSource::from_db_str(source.as_db_str()), Some(source));
        }
    }

    #[test]
    fn only_lotto_cascades() {
        assert!(GameType::Lotto.has_cascade());
        assert!(!GameType::FourD.has_cascade());
        assert!(!GameType::Sweep.has_cascade());
    }
}
