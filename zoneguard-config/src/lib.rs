//! Domain-driven configuration management for zoneguard
//!
//! This crate aggregates the rate limiting, retry and logging settings into
//! one YAML document, with validation, defaults, and environment variable
//! overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::ZoneguardConfig;
pub use zoneguard_logging::{LogFormat, LogLevel, LoggingConfig};
pub use zoneguard_resilience::{Jitter, RateLimitConfig, RetryConfig};
