//! Request ids for queued repository work
//!
//! A job runs on the repository worker, not on the task that submitted it.
//! Its `RequestId` is what ties the caller's handle, the job's log events
//! and any error it returns back together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one submitted operation
///
/// Fresh ids are UUIDv7, so they sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an id minted elsewhere (logs, tests)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
