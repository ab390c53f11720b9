use crate::error::ConfigResult;
use crate::validation::{validate_ordered, validate_positive, Validatable};
use std::time::Duration;
use zoneguard_resilience::RetryConfig;

impl Validatable for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();

        validate_positive(self.max_attempts, "max_attempts", domain)?;
        if self.base_backoff == Duration::ZERO {
            return Err(self.validation_error("base_backoff must be greater than 0"));
        }
        validate_ordered(
            self.base_backoff,
            self.max_backoff,
            "base_backoff",
            "max_backoff",
            domain,
        )?;
        if self.timeout_per_attempt == Duration::ZERO {
            return Err(self.validation_error("timeout_per_attempt must be greater than 0"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "retry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RetryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_retry_settings() {
        assert!(RetryConfig::default().with_max_attempts(0).validate().is_err());

        let inverted = RetryConfig::default()
            .with_backoff(Duration::from_secs(10), Duration::from_secs(1));
        let err = inverted.validate().unwrap_err();
        assert_eq!(err.domain(), Some("retry"));

        let zero_timeout = RetryConfig::default().with_timeout_per_attempt(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());
    }
}
