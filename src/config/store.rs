use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Upper bound on any single store call.
    pub timeout_ms: u64,
    /// Pause before the single retry of a transient failure.
    pub retry_backoff_ms: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            timeout_ms: 5_000,
            retry_backoff_ms: 250,
        }
    }
}
