//! Cache invalidation for the public result pages.
//!
//! After a draw is inserted or updated, the pages that show it are purged
//! through an HTTP endpoint. Failures are reported to the caller, which
//! logs them and carries on: a stale page is preferable to a lost write.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::GameType;

/// Purge request failure.
#[derive(Debug, thiserror::Error)]
pub enum InvalidationError {
    /// The HTTP client could not be built.
    #[error("cache purge client: {0}")]
    Client(String),
    /// The request failed or returned a non-success status.
    #[error("cache purge request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Purges cached pages for a game.
#[async_trait]
pub trait CacheInvalidator: Send + Sync + std::fmt::Debug {
    /// Purges the pages of `game`, including the page for `date` if given.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidationError`] if the purge did not go through.
    async fn invalidate(
        &self,
        game: GameType,
        date: Option<NaiveDate>,
    ) -> Result<(), InvalidationError>;
}

/// Paths to purge for `game`.
#[must_use]
pub fn cache_paths(game: GameType, date: Option<NaiveDate>) -> Vec<String> {
    let slug = game.slug();
    let mut paths = vec![
        "/".to_string(),
        format!("/{slug}"),
        format!("/{slug}/history"),
    ];
    if let Some(date) = date {
        paths.push(format!("/{slug}/{}", date.format("%Y-%m-%d")));
    }
    if game.has_cascade() {
        paths.push(format!("/{slug}/jackpot"));
    }
    paths
}

#[derive(Debug, Serialize)]
struct PurgeRequest<'a> {
    paths: &'a [String],
}

/// Posts purge requests to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpCacheInvalidator {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpCacheInvalidator {
    /// Creates an invalidator posting to `endpoint` with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidationError::Client`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InvalidationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("draw-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InvalidationError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }
}

#[async_trait]
impl CacheInvalidator for HttpCacheInvalidator {
    async fn invalidate(
        &self,
        game: GameType,
        date: Option<NaiveDate>,
    ) -> Result<(), InvalidationError> {
        let paths = cache_paths(game, date);
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&PurgeRequest { paths: &paths });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request.send().await?.error_for_status()?;
        tracing::debug!(game = %game, paths = paths.len(), "cache purged");
        Ok(())
    }
}

/// Invalidator used when no purge endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

#[async_trait]
impl CacheInvalidator for NoopInvalidator {
    async fn invalidate(
        &self,
        game: GameType,
        date: Option<NaiveDate>,
    ) -> Result<(), InvalidationError> {
        tracing::trace!(game = %game, ?date, "no cache purge endpoint configured");
        Ok(())
    }
}
