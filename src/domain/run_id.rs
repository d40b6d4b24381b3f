//! Identifier for a single pipeline run.
//!
//! [`RunId`] wraps a [`uuid::Uuid`] (v4). Each trigger or backfill
//! invocation gets one; it is recorded on the run's tracing span and
//! echoed in the response so scheduler logs can be matched to ours.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of one trigger or backfill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Creates a new random `RunId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
