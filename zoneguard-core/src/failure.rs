//! Raw failures produced at the SDK boundary

use std::fmt;

/// A failure exactly as the remote-call boundary reported it, before
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// The service answered with an error document carrying a code
    Service { code: String, message: String },

    /// Credentials were missing or incomplete
    Credentials { message: String },

    /// Connection-level failure (reset, refused, DNS lookup of the endpoint)
    Network { message: String },

    /// The request or response did not complete in time
    Timeout { message: String },

    /// Client-side SDK failure unrelated to the network
    Sdk { message: String },

    /// Anything else
    Other { message: String },
}

impl RawFailure {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        RawFailure::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        RawFailure::Network {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        RawFailure::Timeout {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        RawFailure::Other {
            message: message.into(),
        }
    }

    /// Whether the failure is a network or timeout condition
    pub fn is_transport(&self) -> bool {
        matches!(self, RawFailure::Network { .. } | RawFailure::Timeout { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            RawFailure::Service { message, .. }
            | RawFailure::Credentials { message }
            | RawFailure::Network { message }
            | RawFailure::Timeout { message }
            | RawFailure::Sdk { message }
            | RawFailure::Other { message } => message,
        }
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawFailure::Service { code, message } => write!(f, "[{}] {}", code, message),
            RawFailure::Credentials { message } => write!(f, "credentials: {}", message),
            RawFailure::Network { message } => write!(f, "network: {}", message),
            RawFailure::Timeout { message } => write!(f, "timeout: {}", message),
            RawFailure::Sdk { message } => write!(f, "sdk: {}", message),
            RawFailure::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RawFailure {}
