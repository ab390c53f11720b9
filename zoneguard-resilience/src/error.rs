use thiserror::Error;

/// Errors raised while constructing rate-limiting components
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResilienceError {
    #[error("Bucket capacity must be at least 1")]
    ZeroCapacity,

    #[error("Refill rate must be positive and finite, got {0}")]
    InvalidRate(f64),

    #[error("Rate bounds are inconsistent: min {min} must be positive and not exceed max {max}")]
    InvalidRateBounds { min: f64, max: f64 },

    #[error("Invalid {name}: {value}")]
    InvalidFactor { name: &'static str, value: f64 },

    #[error("Invalid {name}: must be at least 1")]
    ZeroCount { name: &'static str },
}

pub(crate) fn check_rate(rate: f64) -> Result<f64, ResilienceError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(ResilienceError::InvalidRate(rate))
    }
}
