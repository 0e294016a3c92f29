use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Whether to shave a deterministic jitter off backoff delays
    pub jitter: bool,
    /// Upper bound for a single attempt, in seconds. `None` disables it.
    pub attempt_timeout_seconds: Option<u64>,
}

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 8_000;
const DEFAULT_ATTEMPT_TIMEOUT_SECONDS: u64 = 120;

impl ResilienceConfig {
    /// Creates a default configuration with sane values.
    pub fn defaults() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: false,
            attempt_timeout_seconds: Some(DEFAULT_ATTEMPT_TIMEOUT_SECONDS),
        }
    }

    /// Delay to wait after the failed attempt with the given zero-based index.
    ///
    /// The delay doubles per attempt starting from `base_delay_ms` and is
    /// capped at `max_delay_ms`.
    pub fn backoff_delay(&self, attempt_index: usize) -> Duration {
        let mut delay = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16));
        delay = delay.min(self.max_delay_ms);
        if self.jitter {
            let span = (delay / 2).max(1);
            let jitter = ((attempt_index as u64)
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1))
                % span;
            delay = delay.saturating_sub(jitter);
        }
        Duration::from_millis(delay)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
