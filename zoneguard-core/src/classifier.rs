//! Mapping of raw SDK failures onto typed errors

use crate::error::DnsApiError;
use crate::failure::RawFailure;
use log::debug;
use std::convert::Infallible;
use std::str::FromStr;

/// Remote error codes the classifier knows about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCode {
    NoSuchHostedZone,
    NoSuchChange,
    NoSuchHealthCheck,
    InvalidInput,
    InvalidChangeBatch,
    InvalidDomainName,
    AccessDenied,
    Throttling,
    ThrottlingException,
    PriorRequestNotComplete,
    ServiceUnavailable,
    InternalFailure,
    /// Any code not listed above, kept verbatim
    Unrecognized(String),
}

impl FromStr for ServiceCode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NoSuchHostedZone" => ServiceCode::NoSuchHostedZone,
            "NoSuchChange" => ServiceCode::NoSuchChange,
            "NoSuchHealthCheck" => ServiceCode::NoSuchHealthCheck,
            "InvalidInput" => ServiceCode::InvalidInput,
            "InvalidChangeBatch" => ServiceCode::InvalidChangeBatch,
            "InvalidDomainName" => ServiceCode::InvalidDomainName,
            "AccessDenied" => ServiceCode::AccessDenied,
            "Throttling" => ServiceCode::Throttling,
            "ThrottlingException" => ServiceCode::ThrottlingException,
            "PriorRequestNotComplete" => ServiceCode::PriorRequestNotComplete,
            "ServiceUnavailable" => ServiceCode::ServiceUnavailable,
            "InternalFailure" => ServiceCode::InternalFailure,
            other => ServiceCode::Unrecognized(other.to_string()),
        })
    }
}

/// Total classification of raw failures
///
/// Every [`RawFailure`] maps to exactly one [`DnsApiError`]; there is no
/// passthrough path. Unrecognized failures become
/// [`ErrorKind::Unknown`](crate::ErrorKind::Unknown), retryable only for
/// network and timeout conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, raw: RawFailure) -> DnsApiError {
        debug!("Classifying remote failure: {}", raw);

        match raw {
            RawFailure::Service { code, message } => Self::classify_service(code, message),
            RawFailure::Credentials { message } => {
                DnsApiError::permission(format!("Credentials not configured: {}", message))
            }
            RawFailure::Network { message } => {
                DnsApiError::unknown(format!("Network error: {}", message), true)
            }
            RawFailure::Timeout { message } => {
                DnsApiError::unknown(format!("Request timed out: {}", message), true)
            }
            RawFailure::Sdk { message } => {
                DnsApiError::unknown(format!("SDK error: {}", message), false)
            }
            RawFailure::Other { message } => {
                DnsApiError::unknown(format!("Unexpected error: {}", message), false)
            }
        }
    }

    fn classify_service(code: String, message: String) -> DnsApiError {
        let parsed = match code.parse::<ServiceCode>() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        };

        let error = match parsed {
            ServiceCode::NoSuchHostedZone => {
                DnsApiError::not_found(format!("Hosted zone not found: {}", message))
            }
            ServiceCode::NoSuchChange => {
                DnsApiError::not_found(format!("Change not found: {}", message))
            }
            ServiceCode::NoSuchHealthCheck => {
                DnsApiError::not_found(format!("Health check not found: {}", message))
            }
            ServiceCode::InvalidInput
            | ServiceCode::InvalidChangeBatch
            | ServiceCode::InvalidDomainName => {
                DnsApiError::validation(format!("Invalid input: {}", message))
            }
            ServiceCode::AccessDenied => {
                DnsApiError::permission(format!("Access denied: {}", message))
            }
            ServiceCode::Throttling
            | ServiceCode::ThrottlingException
            | ServiceCode::PriorRequestNotComplete => {
                DnsApiError::throttle(format!("Request throttled: {}", message))
            }
            ServiceCode::ServiceUnavailable | ServiceCode::InternalFailure => DnsApiError::unknown(
                format!("Service unavailable [{}]: {}", code, message),
                true,
            ),
            ServiceCode::Unrecognized(_) => {
                DnsApiError::unknown(format!("Remote error [{}]: {}", code, message), false)
            }
        };

        error.with_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn classify(raw: RawFailure) -> DnsApiError {
        ErrorClassifier::new().classify(raw)
    }

    #[test]
    fn test_known_codes() {
        let err = classify(RawFailure::service("NoSuchHostedZone", "Zone not found"));
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("Zone not found"));
        assert_eq!(err.code.as_deref(), Some("NoSuchHostedZone"));

        let err = classify(RawFailure::service("InvalidInput", "Invalid parameter"));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("Invalid parameter"));

        let err = classify(RawFailure::service("AccessDenied", "Access denied"));
        assert_eq!(err.kind, ErrorKind::Permission);

        let err = classify(RawFailure::service("Throttling", "Rate exceeded"));
        assert_eq!(err.kind, ErrorKind::Throttle);
        assert!(err.message.contains("Rate exceeded"));
        assert!(err.retryable());
    }

    #[test]
    fn test_throttle_aliases() {
        for code in ["ThrottlingException", "PriorRequestNotComplete"] {
            let err = classify(RawFailure::service(code, "busy"));
            assert_eq!(err.kind, ErrorKind::Throttle, "code {}", code);
        }
    }

    #[test]
    fn test_unrecognized_code_is_not_retryable() {
        let err = classify(RawFailure::service("HostedZoneNotEmpty", "still has records"));
        assert_eq!(err.kind, ErrorKind::Unknown { transient: false });
        assert!(!err.retryable());
        assert_eq!(err.code.as_deref(), Some("HostedZoneNotEmpty"));
    }

    #[test]
    fn test_transport_failures_are_retryable() {
        let err = classify(RawFailure::network("connection reset by peer"));
        assert_eq!(err.kind, ErrorKind::Unknown { transient: true });
        assert!(err.retryable());

        let err = classify(RawFailure::timeout("read timed out"));
        assert!(err.retryable());

        let err = classify(RawFailure::service("ServiceUnavailable", "try later"));
        assert!(err.retryable());
    }

    #[test]
    fn test_credentials_and_other_failures() {
        let err = classify(RawFailure::Credentials {
            message: "no credentials found".into(),
        });
        assert_eq!(err.kind, ErrorKind::Permission);

        let err = classify(RawFailure::Sdk {
            message: "bad endpoint".into(),
        });
        assert_eq!(err.kind, ErrorKind::Unknown { transient: false });

        let err = classify(RawFailure::other("boom"));
        assert!(!err.retryable());
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_service_code_parsing() {
        assert_eq!("Throttling".parse::<ServiceCode>().unwrap(), ServiceCode::Throttling);
        assert_eq!(
            "Whatever".parse::<ServiceCode>().unwrap(),
            ServiceCode::Unrecognized("Whatever".to_string())
        );
    }
}
