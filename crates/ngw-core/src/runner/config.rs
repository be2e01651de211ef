use std::time::Duration;

use ngw_model::{TimeoutMs, millis_ceil};
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_MS: TimeoutMs = 20_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Upper bound for a single run, in milliseconds.
    pub timeout_ms: TimeoutMs,
}

impl RunnerConfig {
    /// `timeout` is kept at millisecond resolution, rounded up.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout_ms: millis_ceil(timeout),
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_twenty_seconds() {
        assert_eq!(RunnerConfig::default().timeout(), Duration::from_secs(20));
    }

    #[test]
    fn sub_millisecond_timeout_is_not_zero() {
        let cfg = RunnerConfig::new(Duration::from_nanos(10));
        assert_eq!(cfg.timeout_ms, 1);
    }

    #[test]
    fn oversized_timeout_saturates() {
        assert_eq!(RunnerConfig::new(Duration::MAX).timeout_ms, TimeoutMs::MAX);
    }
}
