//! Input validation for zone, domain and change identifiers
//!
//! These checks run before a request reaches the rate limiter, so a
//! malformed argument never consumes a permit.

use crate::error::{DnsApiError, Result};

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";
const CHANGE_PREFIX: &str = "/change/";
const MAX_DOMAIN_LENGTH: usize = 253;

/// Validate and normalize a hosted zone ID, stripping any `/hostedzone/` prefix
pub fn validate_hosted_zone_id(zone_id: &str) -> Result<String> {
    if zone_id.is_empty() {
        return Err(DnsApiError::validation("Hosted zone ID cannot be empty"));
    }

    let zone_id = zone_id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(zone_id);

    let well_formed = zone_id.chars().all(|c| c.is_ascii_alphanumeric())
        && (8..=32).contains(&zone_id.len());
    if !well_formed {
        return Err(DnsApiError::validation(format!(
            "Invalid hosted zone ID format: {}",
            zone_id
        )));
    }

    Ok(zone_id.to_string())
}

/// Validate a domain name and make it fully qualified
pub fn validate_domain_name(domain: &str) -> Result<String> {
    if domain.is_empty() {
        return Err(DnsApiError::validation("Domain name cannot be empty"));
    }

    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(DnsApiError::validation(format!(
            "Domain name too long (max {} characters)",
            MAX_DOMAIN_LENGTH
        )));
    }

    if domain.ends_with('.') {
        Ok(domain.to_string())
    } else {
        Ok(format!("{}.", domain))
    }
}

/// Validate a change ID, stripping any `/change/` prefix
pub fn validate_change_id(change_id: &str) -> Result<String> {
    let change_id = change_id.strip_prefix(CHANGE_PREFIX).unwrap_or(change_id);
    if change_id.is_empty() {
        return Err(DnsApiError::validation("Change ID cannot be empty"));
    }
    Ok(change_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_valid_hosted_zone_ids() {
        for zone_id in ["Z1234567890123", "Z1A2B3C4D5E6F7", "ZABCDEFGHIJKLMN"] {
            assert!(validate_hosted_zone_id(zone_id).is_ok(), "{}", zone_id);
        }
    }

    #[test]
    fn test_invalid_hosted_zone_ids() {
        let too_long = "a".repeat(33);
        for zone_id in ["", "1234567", "Z123456$", too_long.as_str()] {
            let err = validate_hosted_zone_id(zone_id).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{}", zone_id);
        }
    }

    #[test]
    fn test_hosted_zone_prefix_removed() {
        assert_eq!(
            validate_hosted_zone_id("/hostedzone/Z1234567890123").unwrap(),
            "Z1234567890123"
        );
    }

    #[test]
    fn test_domain_names() {
        assert_eq!(validate_domain_name("example.com").unwrap(), "example.com.");
        assert_eq!(validate_domain_name("sub.example.org.").unwrap(), "sub.example.org.");
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn test_change_ids() {
        assert_eq!(validate_change_id("/change/C2682N5HXP0BZ4").unwrap(), "C2682N5HXP0BZ4");
        assert_eq!(validate_change_id("C1").unwrap(), "C1");
        assert!(validate_change_id("").is_err());
        assert!(validate_change_id("/change/").is_err());
    }
}
