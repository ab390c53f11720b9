//! Domain-specific configuration modules

pub mod logging;
pub mod rate_limit;
pub mod retry;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use zoneguard_logging::LoggingConfig;
use zoneguard_resilience::{RateLimitConfig, RetryConfig};

/// Main zoneguard configuration combining all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ZoneguardConfig {
    /// Permit bucket and adaptive rate bounds
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry and backoff behaviour
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ZoneguardConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = ZoneguardConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
