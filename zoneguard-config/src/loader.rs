//! Configuration loading and environment variable handling

use crate::domains::ZoneguardConfig;
use crate::error::{ConfigError, ConfigResult};
use log::debug;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use zoneguard_logging::{LogFormat, LogLevel, LoggingConfig};
use zoneguard_resilience::{Jitter, RateLimitConfig, RetryConfig};

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "ZONEGUARD".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<ZoneguardConfig> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        self.from_yaml(&content)
    }

    /// Load configuration from YAML text with environment overrides
    pub fn from_yaml(&self, content: &str) -> ConfigResult<ZoneguardConfig> {
        let mut config: ZoneguardConfig = serde_yaml::from_str(content)?;

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config)?;

        // Validate all domains
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<ZoneguardConfig> {
        let mut config = ZoneguardConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<ZoneguardConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut ZoneguardConfig) -> ConfigResult<()> {
        self.apply_rate_limit_overrides(&mut config.rate_limit)?;
        self.apply_retry_overrides(&mut config.retry)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply rate limit config overrides
    fn apply_rate_limit_overrides(&self, config: &mut RateLimitConfig) -> ConfigResult<()> {
        if let Some(capacity) = self.parse_env_var("RATE_LIMIT_CAPACITY")? {
            config.capacity = capacity;
        }
        if let Some(rate) = self.parse_env_var("RATE_LIMIT_INITIAL_RATE")? {
            config.initial_rate = rate;
        }
        if let Some(rate) = self.parse_env_var("RATE_LIMIT_MIN_RATE")? {
            config.min_rate = rate;
        }
        if let Some(rate) = self.parse_env_var("RATE_LIMIT_MAX_RATE")? {
            config.max_rate = rate;
        }
        if let Some(factor) = self.parse_env_var("RATE_LIMIT_DECAY_FACTOR")? {
            config.decay_factor = factor;
        }
        if let Some(factor) = self.parse_env_var("RATE_LIMIT_GROWTH_FACTOR")? {
            config.growth_factor = factor;
        }
        if let Some(streak) = self.parse_env_var("RATE_LIMIT_SUCCESS_STREAK")? {
            config.success_streak_threshold = streak;
        }
        if let Some(window) = self.parse_env_var("RATE_LIMIT_WINDOW_SIZE")? {
            config.window_size = window;
        }

        Ok(())
    }

    /// Apply retry config overrides
    fn apply_retry_overrides(&self, config: &mut RetryConfig) -> ConfigResult<()> {
        if let Some(attempts) = self.parse_env_var("RETRY_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }
        if let Some(ms) = self.parse_env_var("RETRY_BASE_BACKOFF_MS")? {
            config.base_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = self.parse_env_var("RETRY_MAX_BACKOFF_MS")? {
            config.max_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = self.parse_env_var("RETRY_TIMEOUT_PER_ATTEMPT_MS")? {
            config.timeout_per_attempt = Duration::from_millis(ms);
        }
        if let Ok(jitter) = self.get_env_var("RETRY_JITTER") {
            config.jitter = match jitter.trim().to_lowercase().as_str() {
                "none" | "off" | "false" => Jitter::None,
                "uniform" | "on" | "true" => Jitter::Uniform,
                _ => {
                    return Err(ConfigError::EnvError(format!(
                        "Invalid RETRY_JITTER: {}",
                        jitter
                    )))
                }
            };
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_env_var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
