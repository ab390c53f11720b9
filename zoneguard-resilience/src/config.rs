//! Tunables for the permit bucket, the adaptive controller and retries

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backoff::Jitter;

/// Permit bucket and adaptive rate bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum permits held by the bucket
    pub capacity: u32,

    /// Refill rate in permits per second at start-up
    pub initial_rate: f64,

    pub min_rate: f64,

    pub max_rate: f64,

    /// Multiplier applied to the rate on every throttle, in (0, 1)
    pub decay_factor: f64,

    /// Multiplier applied after a success streak, greater than 1
    pub growth_factor: f64,

    /// Consecutive successes required before the rate grows
    pub success_streak_threshold: u32,

    /// Number of recent outcomes kept for statistics
    pub window_size: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            initial_rate: 5.0,
            min_rate: 0.5,
            max_rate: 5.0,
            decay_factor: 0.5,
            growth_factor: 1.1,
            success_streak_threshold: 5,
            window_size: 20,
        }
    }
}

/// Retry behaviour for one guarded call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,

    #[serde(with = "humantime_serde")]
    pub base_backoff: Duration,

    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,

    /// Longest wait for a permit before each attempt
    #[serde(with = "humantime_serde")]
    pub timeout_per_attempt: Duration,

    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(20),
            timeout_per_attempt: Duration::from_secs(30),
            jitter: Jitter::Uniform,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Deterministic backoff, for reproducible runs
    pub fn without_jitter(mut self) -> Self {
        self.jitter = Jitter::None;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    pub fn with_timeout_per_attempt(mut self, timeout: Duration) -> Self {
        self.timeout_per_attempt = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_stay_within_conservative_quota() {
        let config = RateLimitConfig::default();
        assert!(config.max_rate <= 5.0);
        assert!(config.min_rate > 0.0);
        assert!(config.decay_factor < 1.0);
        assert!(config.growth_factor > 1.0);
    }

    #[test]
    fn test_retry_config_from_yaml() {
        let yaml = r#"
max_attempts: 3
base_backoff: 150ms
max_backoff: 5s
jitter: none
"#;
        let config: RetryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_backoff, Duration::from_millis(150));
        assert_eq!(config.max_backoff, Duration::from_secs(5));
        assert_eq!(config.timeout_per_attempt, Duration::from_secs(30));
        assert_eq!(config.jitter, Jitter::None);
    }
}
