//! Headless Chrome sessions via chromiumoxide.
//!
//! The browser process is launched once per run. Every fetch opens its own
//! page and closes it before returning, whatever the outcome; the process
//! itself is shut down by [`FetchSession::close`].

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use super::extract::{PICKER_SELECTOR, parse_draw_number_label};
use super::fetcher::{FetchError, FetchRequest, FetchSession, FetcherLauncher};

/// Timeouts and binary location for the headless browser.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Chrome/Chromium binary; `None` lets chromiumoxide search the PATH.
    pub chrome_executable: Option<String>,
    /// Budget for navigation, waiting for the results node, and reading
    /// the document.
    pub navigation_timeout: Duration,
    /// Budget for the draw indicator to change after a picker selection.
    pub selection_timeout: Duration,
    /// Delay between DOM polls.
    pub poll_interval: Duration,
    /// Pause after the page looks ready, for late XHRs to land.
    pub settle_delay: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            navigation_timeout: Duration::from_secs(30),
            selection_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// Launches headless Chrome sessions.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    /// Creates a launcher with the given settings.
    #[must_use]
    pub const fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl FetcherLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn FetchSession>, FetchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .window_size(1920, 1080)
            .request_timeout(self.settings.navigation_timeout);
        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(FetchError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        // The handler drives the CDP connection and must be polled for the
        // browser to respond at all.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler error");
                }
            }
        });

        tracing::info!("headless browser launched");
        Ok(Box::new(ChromeSession {
            browser: Mutex::new(browser),
            handle,
            settings: self.settings.clone(),
        }))
    }
}

struct ChromeSession {
    browser: Mutex<Browser>,
    handle: JoinHandle<()>,
    settings: BrowserSettings,
}

impl fmt::Debug for ChromeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeSession")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChromeSession {
    async fn render(&self, page: &Page, request: &FetchRequest) -> Result<String, FetchError> {
        let budget = self.settings.navigation_timeout;
        match timeout(budget, page.goto(request.url.as_str())).await {
            Err(_) => {
                return Err(FetchError::Timeout {
                    what: format!("navigation to {}", request.url),
                    elapsed: budget,
                });
            }
            Ok(Err(e)) => {
                return Err(FetchError::Navigation {
                    url: request.url.clone(),
                    reason: e.to_string(),
                });
            }
            Ok(Ok(_)) => {}
        }

        if let Some(selector) = &request.wait_selector {
            self.wait_for_selector(page, selector).await;
        }

        if let Some(value) = &request.select_option_value {
            self.select_draw(page, value, request).await?;
        }

        sleep(self.settings.settle_delay).await;

        match timeout(budget, page.content()).await {
            Err(_) => Err(FetchError::Timeout {
                what: "document content".to_string(),
                elapsed: budget,
            }),
            Ok(Err(e)) => Err(FetchError::Script(e.to_string())),
            Ok(Ok(html)) => Ok(html),
        }
    }

    /// Polls until `selector` matches. Absence after the budget is not an
    /// error: the extractor reports it as "no data yet".
    async fn wait_for_selector(&self, page: &Page, selector: &str) {
        let deadline = Instant::now() + self.settings.navigation_timeout;
        loop {
            if page.find_element(selector).await.is_ok() {
                return;
            }
            if Instant::now() >= deadline {
                tracing::debug!(selector, "results node did not appear");
                return;
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Picks a historical draw and waits, best-effort, for the draw number
    /// indicator to move away from the previously shown draw.
    async fn select_draw(
        &self,
        page: &Page,
        value: &str,
        request: &FetchRequest,
    ) -> Result<(), FetchError> {
        // The indicator as rendered right now is the baseline; the caller's
        // number only covers pages where it cannot be read yet.
        let baseline = match &request.indicator_selector {
            Some(indicator) => read_draw_number(page, indicator)
                .await
                .or(request.previous_draw_number),
            None => request.previous_draw_number,
        };

        let script = format!(
            "(() => {{ const s = document.querySelector({picker}); \
             if (!s) return false; s.value = {value}; \
             s.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            picker = js_string(PICKER_SELECTOR),
            value = js_string(value),
        );
        let selected: bool = page
            .evaluate(script)
            .await
            .map_err(|e| FetchError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| FetchError::Script(e.to_string()))?;
        if !selected {
            return Err(FetchError::Script("draw picker not found".to_string()));
        }

        let Some(indicator) = &request.indicator_selector else {
            return Ok(());
        };
        let deadline = Instant::now() + self.settings.selection_timeout;
        loop {
            // Evaluation fails while the page navigates; treat that as "not yet".
            if let Some(current) = read_draw_number(page, indicator).await
                && Some(current) != baseline
            {
                return Ok(());
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    option = value,
                    previous = ?baseline,
                    "draw indicator did not change after selection; reading page as is"
                );
                return Ok(());
            }
            sleep(self.settings.poll_interval).await;
        }
    }
}

async fn read_draw_number(page: &Page, selector: &str) -> Option<u32> {
    let script = format!(
        "(() => {{ const el = document.querySelector({sel}); return el ? el.textContent : null; }})()",
        sel = js_string(selector),
    );
    let text: Option<String> = page.evaluate(script).await.ok()?.into_value().ok()?;
    text.as_deref().and_then(parse_draw_number_label)
}

/// Quotes `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait]
impl FetchSession for ChromeSession {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Navigation {
                    url: request.url.clone(),
                    reason: e.to_string(),
                })?
        };

        let result = self.render(&page, request).await;

        if let Err(e) = page.close().await {
            tracing::warn!(error = %e, url = %request.url, "failed to close page");
        }
        result
    }

    async fn close(self: Box<Self>) {
        let Self {
            browser, handle, ..
        } = *self;
        let mut browser = browser.into_inner();
        match timeout(Duration::from_secs(10), browser.close()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "browser close failed"),
            Err(_) => tracing::warn!("browser close timed out"),
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "browser wait failed");
        }
        handle.abort();
        tracing::info!("headless browser closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_escapes_quotes() {
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("select.selectDrawList"), "\"select.selectDrawList\"");
    }

    #[test]
    fn default_settings_are_bounded() {
        let settings = BrowserSettings::default();
        assert_eq!(settings.selection_timeout, Duration::from_secs(10));
        assert!(settings.navigation_timeout <= Duration::from_secs(30));
    }
}
