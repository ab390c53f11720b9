//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};
use std::cmp::Ordering;

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a positive number; NaN is rejected
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if !(value > T::default()) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate that a value lies strictly between two bounds
pub fn validate_exclusive_range(
    value: f64,
    min: f64,
    max: f64,
    field_name: &str,
    domain: &str,
) -> ConfigResult<()> {
    if !(value > min && value < max) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} must be between {} and {} (exclusive), got {}",
                field_name, min, max, value
            ),
        });
    }
    Ok(())
}

/// Validate that `lower <= upper`; values that do not compare are rejected
pub fn validate_ordered<T>(
    lower: T,
    upper: T,
    lower_name: &str,
    upper_name: &str,
    domain: &str,
) -> ConfigResult<()>
where
    T: PartialOrd + std::fmt::Debug,
{
    if !matches!(lower.partial_cmp(&upper), Some(Ordering::Less | Ordering::Equal)) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} ({:?}) must not exceed {} ({:?})",
                lower_name, lower, upper_name, upper
            ),
        });
    }
    Ok(())
}
