//! Polling settings for long-running ARM operations
//!
//! Stored per profile; the CLI can override them per invocation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long and how often to poll a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Give up after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between status requests
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl PollingConfig {
    /// Zero is treated as the one-second minimum
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(MIN_SECS))
    }

    /// Zero is treated as the one-second minimum
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_SECS))
    }

    /// Apply per-invocation overrides
    #[must_use]
    pub fn with_overrides(mut self, timeout_secs: Option<u64>, interval_secs: Option<u64>) -> Self {
        if let Some(timeout) = timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(interval) = interval_secs {
            self.interval_secs = interval;
        }
        self
    }
}

const MIN_SECS: u64 = 1;

// Server creation routinely takes 10+ minutes
fn default_timeout_secs() -> u64 {
    1800
}

fn default_interval_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PollingConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(1800));
        assert_eq!(config.interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PollingConfig = toml::from_str("interval_secs = 3").unwrap();
        assert_eq!(config.interval_secs, 3);
        assert_eq!(config.timeout_secs, 1800);
    }

    #[test]
    fn test_overrides() {
        let config = PollingConfig::default().with_overrides(Some(60), None);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.interval_secs, 10);

        let config = PollingConfig::default().with_overrides(None, Some(1));
        assert_eq!(config.timeout_secs, 1800);
        assert_eq!(config.interval_secs, 1);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config: PollingConfig =
            toml::from_str("timeout_secs = 0\ninterval_secs = 0").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.interval(), Duration::from_secs(1));

        let config = PollingConfig::default().with_overrides(Some(0), Some(0));
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.interval(), Duration::from_secs(1));
    }
}
