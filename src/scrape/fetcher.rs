//! Page fetcher contract.
//!
//! A [`FetcherLauncher`] starts one browser session per run; the session
//! renders pages on demand through [`FetchSession::fetch`] and must be
//! released with [`FetchSession::close`] on every exit path of the run.
//! The pipeline only sees these traits, so tests drive it with canned
//! HTML instead of a real browser.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Error raised while launching a browser or rendering a page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The browser process could not be started.
    #[error("browser launch failed: {0}")]
    Launch(String),
    /// Navigation to the target URL failed.
    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        /// Target URL.
        url: String,
        /// Underlying error message.
        reason: String,
    },
    /// A bounded wait ran out.
    #[error("timed out after {elapsed:?} waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// How long the wait lasted.
        elapsed: Duration,
    },
    /// A page script (selection, polling) failed.
    #[error("page script failed: {0}")]
    Script(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Navigation { .. } | Self::Timeout { .. })
    }
}

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Results page URL.
    pub url: String,
    /// Selector whose presence means the results have rendered.
    pub wait_selector: Option<String>,
    /// Draw picker value to select before reading the document.
    pub select_option_value: Option<String>,
    /// Selector of the element showing the current draw number.
    pub indicator_selector: Option<String>,
    /// Draw number shown before the selection; the fetcher waits for the
    /// indicator to move away from it.
    pub previous_draw_number: Option<u32>,
}

impl FetchRequest {
    /// Request for the page as it loads, without selecting a draw.
    #[must_use]
    pub fn latest(url: impl Into<String>, wait_selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wait_selector: Some(wait_selector.into()),
            select_option_value: None,
            indicator_selector: None,
            previous_draw_number: None,
        }
    }

    /// Same page with a historical draw selected from the picker.
    #[must_use]
    pub fn with_selection(
        mut self,
        option_value: impl Into<String>,
        indicator_selector: impl Into<String>,
        previous_draw_number: Option<u32>,
    ) -> Self {
        self.select_option_value = Some(option_value.into());
        self.indicator_selector = Some(indicator_selector.into());
        self.previous_draw_number = previous_draw_number;
        self
    }
}

/// An open browser session.
#[async_trait]
pub trait FetchSession: Send + Sync {
    /// Renders the requested page and returns its HTML after network
    /// activity settled. Opens and closes exactly one page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on navigation, timeout or script failure.
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;

    /// Tears the session down. Called once, on every exit path.
    async fn close(self: Box<Self>);
}

/// Starts browser sessions.
#[async_trait]
pub trait FetcherLauncher: Send + Sync + fmt::Debug {
    /// Launches a fresh session for one run.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Launch`] if the browser cannot start.
    async fn launch(&self) -> Result<Box<dyn FetchSession>, FetchError>;
}
