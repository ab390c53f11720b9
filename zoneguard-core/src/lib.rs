//! Core types for zoneguard
//!
//! This crate defines the error language shared by every other zoneguard
//! crate: the raw failures a DNS-management SDK can raise, the typed
//! errors callers see, and the classifier that maps one onto the other.

pub mod classifier;
pub mod error;
pub mod failure;
pub mod validation;

// Re-export commonly used types at the crate root
pub use classifier::{ErrorClassifier, ServiceCode};
pub use error::{DnsApiError, ErrorKind, Result, Retryable};
pub use failure::RawFailure;
pub use validation::{validate_change_id, validate_domain_name, validate_hosted_zone_id};
