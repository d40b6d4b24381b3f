//! Scraping layer: browser sessions, rendered-page extraction and draw
//! date normalization.
//!
//! Only [`crate::domain::DrawRecord`]s that passed validation leave this
//! module.

pub mod browser;
pub mod dates;
pub mod extract;
pub mod fetcher;

pub use browser::{BrowserSettings, ChromeLauncher};
pub use fetcher::{FetchError, FetchRequest, FetchSession, FetcherLauncher};

use crate::domain::GameType;

/// Default location of the operator's result pages.
pub const DEFAULT_RESULTS_BASE_URL: &str = "https://www.singaporepools.com.sg/en/product/Pages";

/// Result page URLs per game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCatalog {
    base_url: String,
}

impl PageCatalog {
    /// Creates a catalog rooted at `base_url`; a trailing slash is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Results page for `game`.
    #[must_use]
    pub fn url(&self, game: GameType) -> String {
        let page = match game {
            GameType::FourD => "4d_results.aspx",
            GameType::Lotto => "toto_result.aspx",
            GameType::Sweep => "sweep_results.aspx",
        };
        format!("{}/{page}", self.base_url)
    }

    /// Request for the latest draw of `game`, waiting on its results node.
    #[must_use]
    pub fn latest_request(&self, game: GameType) -> FetchRequest {
        FetchRequest::latest(self.url(game), extract::container_selector(game))
    }
}

impl Default for PageCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_BASE_URL)
    }
}
