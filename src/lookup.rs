//! Time bounds for individual store lookups.

use std::future::Future;
use std::time::Duration;

use crate::store::StoreError;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a single per-post lookup may take before the caller gives up
/// on it and falls back to a degraded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupPolicy {
    pub timeout: Duration,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

impl LookupPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `lookup`, turning expiry into [`StoreError::Unavailable`].
    pub async fn bounded<T, F>(&self, lookup: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!(
                "lookup timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
