//! Adaptive refill-rate control driven by call outcomes

use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::RateLimitConfig;
use crate::error::{check_rate, ResilienceError};
use crate::token_bucket::TokenBucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Throttle,
}

#[derive(Debug)]
struct AdaptiveState {
    consecutive_successes: u32,
    consecutive_throttles: u32,
    window: VecDeque<Outcome>,
    increases: u64,
    decreases: u64,
}

impl AdaptiveState {
    fn push(&mut self, outcome: Outcome, window_size: usize) {
        if self.window.len() == window_size {
            self.window.pop_front();
        }
        self.window.push_back(outcome);
    }
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptiveSnapshot {
    pub current_rate: f64,
    pub consecutive_successes: u32,
    pub consecutive_throttles: u32,
    /// Growth decisions taken so far
    pub increases: u64,
    /// Decay decisions taken so far
    pub decreases: u64,
    pub window_len: usize,
    /// Share of throttles among the outcomes in the window
    pub throttle_ratio: f64,
}

/// Tunes the bucket's refill rate from observed outcomes
///
/// A throttle decays the rate immediately. Growth happens only after a full
/// streak of successes, so recovery is slower than backing off. The rate
/// always stays within `[min_rate, max_rate]`.
#[derive(Debug)]
pub struct AdaptiveController {
    bucket: Arc<TokenBucket>,
    config: RateLimitConfig,
    state: Mutex<AdaptiveState>,
}

impl AdaptiveController {
    /// Take control of `bucket`, clamping its rate into the configured bounds
    pub fn new(bucket: Arc<TokenBucket>, config: RateLimitConfig) -> Result<Self, ResilienceError> {
        validate(&config)?;

        let (min, max) = (config.min_rate, config.max_rate);
        bucket.adjust_rate(|rate| rate.clamp(min, max));

        Ok(Self {
            bucket,
            state: Mutex::new(AdaptiveState {
                consecutive_successes: 0,
                consecutive_throttles: 0,
                window: VecDeque::with_capacity(config.window_size),
                increases: 0,
                decreases: 0,
            }),
            config,
        })
    }

    /// Build a fresh bucket from `config` and control it
    pub fn from_config(config: RateLimitConfig) -> Result<Self, ResilienceError> {
        let bucket = TokenBucket::new(config.capacity, config.initial_rate)?;
        Self::new(Arc::new(bucket), config)
    }

    pub fn bucket(&self) -> &Arc<TokenBucket> {
        &self.bucket
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn current_rate(&self) -> f64 {
        self.bucket.refill_rate()
    }

    /// Count a success; grows the rate once the streak threshold is reached
    ///
    /// Returns the rate in force afterwards.
    pub fn record_success(&self) -> f64 {
        let mut state = self.state.lock();
        state.consecutive_successes += 1;
        state.consecutive_throttles = 0;
        state.push(Outcome::Success, self.config.window_size);

        if state.consecutive_successes < self.config.success_streak_threshold {
            return self.bucket.refill_rate();
        }

        state.consecutive_successes = 0;
        state.increases += 1;
        let (growth, max) = (self.config.growth_factor, self.config.max_rate);
        let (old, new) = self.bucket.adjust_rate(|rate| (rate * growth).min(max));
        if new > old {
            info!("Success streak reached, raising request rate {:.3}/s -> {:.3}/s", old, new);
        }
        new
    }

    /// Decay the rate immediately after a throttle
    ///
    /// Returns the rate in force afterwards.
    pub fn record_throttle(&self) -> f64 {
        let mut state = self.state.lock();
        state.consecutive_successes = 0;
        state.consecutive_throttles += 1;
        state.decreases += 1;
        state.push(Outcome::Throttle, self.config.window_size);

        let (decay, min) = (self.config.decay_factor, self.config.min_rate);
        let (old, new) = self.bucket.adjust_rate(|rate| (rate * decay).max(min));
        debug!(
            "Throttled ({} in a row), lowering request rate {:.3}/s -> {:.3}/s",
            state.consecutive_throttles, old, new
        );
        new
    }

    pub fn snapshot(&self) -> AdaptiveSnapshot {
        let state = self.state.lock();
        let throttles = state
            .window
            .iter()
            .filter(|o| **o == Outcome::Throttle)
            .count();
        let throttle_ratio = if state.window.is_empty() {
            0.0
        } else {
            throttles as f64 / state.window.len() as f64
        };

        AdaptiveSnapshot {
            current_rate: self.bucket.refill_rate(),
            consecutive_successes: state.consecutive_successes,
            consecutive_throttles: state.consecutive_throttles,
            increases: state.increases,
            decreases: state.decreases,
            window_len: state.window.len(),
            throttle_ratio,
        }
    }
}

fn validate(config: &RateLimitConfig) -> Result<(), ResilienceError> {
    if config.capacity == 0 {
        return Err(ResilienceError::ZeroCapacity);
    }
    check_rate(config.min_rate)?;
    check_rate(config.max_rate)?;
    if config.min_rate > config.max_rate {
        return Err(ResilienceError::InvalidRateBounds {
            min: config.min_rate,
            max: config.max_rate,
        });
    }
    if !(config.decay_factor > 0.0 && config.decay_factor < 1.0) {
        return Err(ResilienceError::InvalidFactor {
            name: "decay_factor",
            value: config.decay_factor,
        });
    }
    if !(config.growth_factor > 1.0 && config.growth_factor.is_finite()) {
        return Err(ResilienceError::InvalidFactor {
            name: "growth_factor",
            value: config.growth_factor,
        });
    }
    if config.success_streak_threshold == 0 {
        return Err(ResilienceError::ZeroCount {
            name: "success_streak_threshold",
        });
    }
    if config.window_size == 0 {
        return Err(ResilienceError::ZeroCount { name: "window_size" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            capacity: 5,
            initial_rate: 5.0,
            min_rate: 1.0,
            max_rate: 10.0,
            decay_factor: 0.5,
            growth_factor: 1.1,
            success_streak_threshold: 3,
            window_size: 4,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_throttle_decays_and_floors() {
        let controller = AdaptiveController::from_config(config()).unwrap();

        assert!(approx(controller.record_throttle(), 2.5));
        assert!(approx(controller.record_throttle(), 1.25));
        assert!(approx(controller.record_throttle(), 1.0));
        assert!(approx(controller.record_throttle(), 1.0));
        assert!(approx(controller.bucket().refill_rate(), 1.0));
        assert_eq!(controller.snapshot().consecutive_throttles, 4);
    }

    #[test]
    fn test_growth_after_exact_streak() {
        let controller = AdaptiveController::from_config(config()).unwrap();

        controller.record_success();
        controller.record_success();
        assert!(approx(controller.current_rate(), 5.0));

        assert!(approx(controller.record_success(), 5.5));
        assert_eq!(controller.snapshot().consecutive_successes, 0);
        assert_eq!(controller.snapshot().increases, 1);
    }

    #[test]
    fn test_growth_capped_at_max() {
        let mut cfg = config();
        cfg.initial_rate = 9.5;
        let controller = AdaptiveController::from_config(cfg).unwrap();

        for _ in 0..3 {
            controller.record_success();
        }
        assert!(approx(controller.current_rate(), 10.0));
    }

    #[test]
    fn test_throttle_breaks_success_streak() {
        let controller = AdaptiveController::from_config(config()).unwrap();

        controller.record_success();
        controller.record_success();
        controller.record_throttle();
        controller.record_success();
        controller.record_success();
        // Two successes since the throttle are not a full streak
        assert!(approx(controller.current_rate(), 2.5));

        controller.record_success();
        assert!(approx(controller.current_rate(), 2.75));
    }

    #[test]
    fn test_initial_rate_clamped_into_bounds() {
        let mut cfg = config();
        cfg.initial_rate = 50.0;
        let controller = AdaptiveController::from_config(cfg).unwrap();
        assert!(approx(controller.current_rate(), 10.0));
    }

    #[test]
    fn test_snapshot_window_is_bounded() {
        let controller = AdaptiveController::from_config(config()).unwrap();
        controller.record_throttle();
        for _ in 0..4 {
            controller.record_success();
        }
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.window_len, 4);
        assert_eq!(snapshot.throttle_ratio, 0.0);

        controller.record_throttle();
        assert!(approx(controller.snapshot().throttle_ratio, 0.25));
    }

    #[test]
    fn test_rejects_invalid_bounds() {
        let mut cfg = config();
        cfg.min_rate = 0.0;
        assert!(matches!(
            AdaptiveController::from_config(cfg),
            Err(ResilienceError::InvalidRate(_))
        ));

        let mut cfg = config();
        cfg.min_rate = 20.0;
        assert!(matches!(
            AdaptiveController::from_config(cfg),
            Err(ResilienceError::InvalidRateBounds { .. })
        ));

        let mut cfg = config();
        cfg.decay_factor = 1.0;
        assert!(matches!(
            AdaptiveController::from_config(cfg),
            Err(ResilienceError::InvalidFactor { name: "decay_factor", .. })
        ));

        let mut cfg = config();
        cfg.success_streak_threshold = 0;
        assert!(AdaptiveController::from_config(cfg).is_err());
    }
}
