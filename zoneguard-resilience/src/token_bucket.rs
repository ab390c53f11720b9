//! Permit bucket guarding remote calls

use log::trace;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

use crate::context::deadline_after;
use crate::error::{check_rate, ResilienceError};

/// Tolerance for float drift when checking for a whole token
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
struct BucketState {
    capacity: f64,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant) {
        // A clock reading older than the last refill counts as zero elapsed
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();

        let tokens_to_add = elapsed * self.refill_rate;
        self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    fn try_consume(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);

        if self.tokens >= 1.0 - EPSILON {
            self.tokens = (self.tokens - 1.0).max(0.0);
            Ok(())
        } else {
            Err(self.time_until_available())
        }
    }

    fn time_until_available(&self) -> Duration {
        if self.tokens >= 1.0 - EPSILON {
            return Duration::ZERO;
        }
        let seconds = (1.0 - self.tokens) / self.refill_rate;
        // Round up so a waiter never wakes just short of a whole token
        let nanos = (seconds * 1e9).ceil().max(1.0);
        Duration::from_nanos(nanos.min(u64::MAX as f64) as u64)
    }
}

/// Fixed-capacity, steadily refilling counter of permits
///
/// All reads and writes of the token count, the refill timestamp and the
/// refill rate go through one lock. The lock is never held across a sleep.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket
    pub fn new(capacity: u32, refill_rate: f64) -> Result<Self, ResilienceError> {
        Self::starting_at(capacity, refill_rate, Instant::now())
    }

    pub(crate) fn starting_at(
        capacity: u32,
        refill_rate: f64,
        now: Instant,
    ) -> Result<Self, ResilienceError> {
        if capacity == 0 {
            return Err(ResilienceError::ZeroCapacity);
        }
        let refill_rate = check_rate(refill_rate)?;

        Ok(Self {
            state: Mutex::new(BucketState {
                capacity: capacity as f64,
                tokens: capacity as f64,
                refill_rate,
                last_refill: now,
            }),
        })
    }

    /// Consume one permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now()).is_ok()
    }

    /// Wait up to `timeout` for a permit
    pub async fn acquire(&self, timeout: Duration) -> bool {
        self.acquire_until(deadline_after(Instant::now(), timeout)).await
    }

    /// Wait until `deadline` for a permit
    ///
    /// Returns `false` when the deadline passes first. Waiters are not
    /// queued; whoever re-checks first after a refill wins the permit.
    pub async fn acquire_until(&self, deadline: Instant) -> bool {
        loop {
            let now = Instant::now();
            let wait = match self.try_acquire_at(now) {
                Ok(()) => return true,
                Err(wait) => wait,
            };

            if now >= deadline {
                return false;
            }

            trace!("No permit available, waiting {:?}", wait);
            sleep_until(deadline_after(now, wait).min(deadline)).await;
        }
    }

    /// Consume a permit as of `now`, or report how long until one accrues
    pub(crate) fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        self.state.lock().try_consume(now)
    }

    pub(crate) fn available_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock();
        state.refill(now);
        state.tokens
    }

    /// Tokens currently available, after a lazy refill
    pub fn available(&self) -> f64 {
        self.available_at(Instant::now())
    }

    pub fn time_until_available(&self) -> Duration {
        let mut state = self.state.lock();
        state.refill(Instant::now());
        state.time_until_available()
    }

    pub fn capacity(&self) -> u32 {
        self.state.lock().capacity as u32
    }

    pub fn refill_rate(&self) -> f64 {
        self.state.lock().refill_rate
    }

    /// Replace the refill rate under the bucket lock
    ///
    /// Tokens accrued at the old rate are settled first. A non-positive or
    /// non-finite result from `f` leaves the rate unchanged. Returns the old
    /// and new rates.
    pub fn adjust_rate<F>(&self, f: F) -> (f64, f64)
    where
        F: FnOnce(f64) -> f64,
    {
        self.adjust_rate_at(Instant::now(), f)
    }

    pub(crate) fn adjust_rate_at<F>(&self, now: Instant, f: F) -> (f64, f64)
    where
        F: FnOnce(f64) -> f64,
    {
        let mut state = self.state.lock();
        state.refill(now);

        let old = state.refill_rate;
        if let Ok(new) = check_rate(f(old)) {
            state.refill_rate = new;
        }
        (old, state.refill_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rejects_invalid_construction() {
        assert_eq!(
            TokenBucket::new(0, 5.0).unwrap_err(),
            ResilienceError::ZeroCapacity
        );
        assert!(matches!(
            TokenBucket::new(5, 0.0),
            Err(ResilienceError::InvalidRate(_))
        ));
        assert!(TokenBucket::new(5, f64::NAN).is_err());
    }

    #[test]
    fn test_burst_then_refill() {
        let start = Instant::now();
        let bucket = TokenBucket::starting_at(5, 5.0, start).unwrap();

        for _ in 0..5 {
            assert!(bucket.try_acquire_at(start).is_ok());
        }
        let wait = bucket.try_acquire_at(start).unwrap_err();
        assert!(wait >= ms(200) && wait <= ms(200) + Duration::from_nanos(1));

        assert!(bucket.try_acquire_at(start + ms(200)).is_ok());
        assert!(bucket.try_acquire_at(start + ms(200)).is_err());
    }

    #[test]
    fn test_clock_skew_counts_as_zero_elapsed() {
        let start = Instant::now() + Duration::from_secs(10);
        let bucket = TokenBucket::starting_at(1, 1.0, start).unwrap();

        assert!(bucket.try_acquire_at(start).is_ok());
        // An earlier reading must not add or remove tokens
        assert!(bucket.try_acquire_at(start - Duration::from_secs(5)).is_err());
        assert_eq!(bucket.available_at(start), 0.0);
        assert!(bucket.try_acquire_at(start + Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_adjust_rate_settles_old_rate_first() {
        let start = Instant::now();
        let bucket = TokenBucket::starting_at(10, 10.0, start).unwrap();
        for _ in 0..10 {
            assert!(bucket.try_acquire_at(start).is_ok());
        }

        // 100ms at 10/s is one token, earned before the rate drops
        let (old, new) = bucket.adjust_rate_at(start + ms(100), |r| r / 10.0);
        assert_eq!(old, 10.0);
        assert_eq!(new, 1.0);
        assert!((bucket.available_at(start + ms(100)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_rate_ignores_invalid_rate() {
        let bucket = TokenBucket::new(5, 2.0).unwrap();
        assert_eq!(bucket.adjust_rate(|_| 0.0), (2.0, 2.0));
        assert_eq!(bucket.adjust_rate(|_| f64::INFINITY), (2.0, 2.0));
        assert_eq!(bucket.refill_rate(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_acquire_waits_for_refill() {
        let bucket = TokenBucket::new(1, 2.0).unwrap();
        assert!(bucket.try_acquire());

        let started = Instant::now();
        assert!(bucket.acquire(Duration::from_secs(1)).await);
        let waited = started.elapsed();
        assert!(waited >= ms(500) && waited < ms(502));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_acquire_times_out() {
        let bucket = TokenBucket::new(1, 0.5).unwrap();
        assert!(bucket.try_acquire());

        let started = Instant::now();
        assert!(!bucket.acquire(ms(300)).await);
        let waited = started.elapsed();
        assert!(waited >= ms(300) && waited < ms(302));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_acquires() {
        let bucket = TokenBucket::new(1, 2.0).unwrap();
        assert!(bucket.acquire(Duration::MAX).await);

        let started = Instant::now();
        assert!(bucket.acquire(Duration::MAX).await);
        assert!(started.elapsed() >= ms(500) && started.elapsed() < ms(502));
    }

    proptest! {
        #[test]
        fn prop_spaced_acquisitions_never_block(
            capacity in 1u32..10,
            rate in 0.5f64..50.0,
            gaps in proptest::collection::vec(0u64..1_000_000, 1..50),
        ) {
            let start = Instant::now();
            let bucket = TokenBucket::starting_at(capacity, rate, start).unwrap();
            let interval = Duration::from_nanos((1e9 / rate).ceil() as u64);

            let mut now = start;
            prop_assert!(bucket.try_acquire_at(now).is_ok());
            for gap in gaps {
                now += interval + Duration::from_nanos(gap);
                prop_assert!(bucket.try_acquire_at(now).is_ok());
            }
        }

        #[test]
        fn prop_tokens_never_exceed_capacity(
            capacity in 1u32..20,
            rate in 0.1f64..100.0,
            steps in proptest::collection::vec((0u64..120_000, any::<bool>()), 1..50),
        ) {
            let start = Instant::now();
            let bucket = TokenBucket::starting_at(capacity, rate, start).unwrap();

            let mut now = start;
            for (advance_ms, acquire) in steps {
                now += Duration::from_millis(advance_ms);
                if acquire {
                    let _ = bucket.try_acquire_at(now);
                }
                let available = bucket.available_at(now);
                prop_assert!(available <= capacity as f64);
                prop_assert!(available >= 0.0);
            }
        }
    }
}
