use crate::error::ConfigResult;
use crate::validation::{validate_exclusive_range, validate_ordered, validate_positive, Validatable};
use zoneguard_resilience::RateLimitConfig;

impl Validatable for RateLimitConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();

        validate_positive(self.capacity, "capacity", domain)?;
        validate_positive(self.min_rate, "min_rate", domain)?;
        if !self.max_rate.is_finite() {
            return Err(self.validation_error(format!(
                "max_rate must be finite, got {}",
                self.max_rate
            )));
        }
        validate_ordered(self.min_rate, self.initial_rate, "min_rate", "initial_rate", domain)?;
        validate_ordered(self.initial_rate, self.max_rate, "initial_rate", "max_rate", domain)?;
        validate_exclusive_range(self.decay_factor, 0.0, 1.0, "decay_factor", domain)?;
        validate_exclusive_range(self.growth_factor, 1.0, f64::INFINITY, "growth_factor", domain)?;
        validate_positive(self.success_streak_threshold, "success_streak_threshold", domain)?;
        validate_positive(self.window_size, "window_size", domain)?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "rate_limit"
    }
}
