//! Typed errors surfaced to callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for zoneguard operations
pub type Result<T> = std::result::Result<T, DnsApiError>;

/// Classified kind of a remote-call failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced zone, change or record does not exist
    NotFound,
    /// The request was rejected as malformed
    Validation,
    /// The caller is not allowed to perform the request
    Permission,
    /// The caller exceeded the service quota
    Throttle,
    /// Unrecognized failure; `transient` marks network and timeout conditions
    Unknown { transient: bool },
}

impl ErrorKind {
    /// Throttle and transient unknown failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Throttle => true,
            ErrorKind::Unknown { transient } => *transient,
            ErrorKind::NotFound | ErrorKind::Validation | ErrorKind::Permission => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Permission => "permission",
            ErrorKind::Throttle => "throttle",
            ErrorKind::Unknown { .. } => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed error returned by every zoneguard operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}{}", attempts_suffix(.attempts))]
pub struct DnsApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Remote error code, when the service supplied one
    pub code: Option<String>,
    /// Total attempts made before this error was surfaced
    pub attempts: Option<u32>,
}

fn attempts_suffix(attempts: &Option<u32>) -> String {
    match attempts {
        Some(1) => " (after 1 attempt)".to_string(),
        Some(n) => format!(" (after {} attempts)", n),
        None => String::new(),
    }
}

impl DnsApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            attempts: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    pub fn throttle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttle, message)
    }

    pub fn unknown(message: impl Into<String>, transient: bool) -> Self {
        Self::new(ErrorKind::Unknown { transient }, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Derived from the kind; never stored separately
    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn is_throttle(&self) -> bool {
        self.kind == ErrorKind::Throttle
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    /// Whether this error is retryable
    fn is_retryable(&self) -> bool;

    /// Whether this is a transport-level condition rather than a service answer
    fn is_transient(&self) -> bool {
        false
    }

    /// Custom retry delay for this error type
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for DnsApiError {
    fn is_retryable(&self) -> bool {
        self.retryable()
    }

    fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Unknown { transient: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_derived_from_kind() {
        assert!(DnsApiError::throttle("slow down").retryable());
        assert!(DnsApiError::unknown("reset", true).retryable());
        assert!(!DnsApiError::unknown("weird", false).retryable());
        assert!(!DnsApiError::not_found("zone").retryable());
        assert!(!DnsApiError::validation("bad").retryable());
        assert!(!DnsApiError::permission("denied").retryable());
    }

    #[test]
    fn test_display_includes_attempts() {
        let err = DnsApiError::throttle("Request throttled: Rate exceeded");
        assert_eq!(err.to_string(), "throttle error: Request throttled: Rate exceeded");

        let err = err.with_attempts(3);
        assert_eq!(
            err.to_string(),
            "throttle error: Request throttled: Rate exceeded (after 3 attempts)"
        );
        assert_eq!(
            DnsApiError::validation("x").with_attempts(1).to_string(),
            "validation error: x (after 1 attempt)"
        );
    }

    #[test]
    fn test_transient_marker() {
        let err = DnsApiError::unknown("connection reset", true);
        assert!(err.is_transient());
        assert!(!DnsApiError::throttle("t").is_transient());
    }

    #[test]
    fn test_kind_serializes_with_tag() {
        let json = serde_json::to_value(ErrorKind::Unknown { transient: true }).unwrap();
        assert_eq!(json["kind"], "unknown");
        assert_eq!(json["transient"], true);

        let json = serde_json::to_value(ErrorKind::Throttle).unwrap();
        assert_eq!(json["kind"], "throttle");
    }
}
