//! Backoff delays between retry attempts

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Randomisation added on top of the exponential delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jitter {
    /// Deterministic delays
    None,
    /// Uniform random value in `[0, base_delay)`
    #[default]
    Uniform,
}

/// Exponential backoff calculator
///
/// The n-th retry waits `min(base * 2^(n-1) + jitter, max)`.
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    base_delay: Duration,
    max_delay: Duration,
    jitter: Jitter,
}

impl BackoffCalculator {
    /// Create a new backoff calculator
    pub fn new(base_delay: Duration, max_delay: Duration, jitter: Jitter) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter,
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-indexed)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay = self.exponential(attempt).saturating_add(self.jitter_amount(attempt));
        delay.min(self.max_delay)
    }

    /// Delay for `attempt` without jitter, capped at the maximum
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.exponential(attempt).min(self.max_delay)
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn exponential(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(64);
        let nanos = self.base_delay.as_nanos().saturating_mul(1u128 << exponent);
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }

    fn jitter_amount(&self, attempt: u32) -> Duration {
        let base_nanos = self.base_delay.as_nanos().min(u64::MAX as u128) as u64;
        match self.jitter {
            Jitter::Uniform if attempt > 0 && base_nanos > 0 => {
                Duration::from_nanos(rand::thread_rng().gen_range(0..base_nanos))
            }
            _ => Duration::ZERO,
        }
    }
}
