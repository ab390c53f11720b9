//! Hosted zone and record operations for zoneguard
//!
//! This crate exposes DNS record and zone operations that run every SDK call
//! through the rate-limited retry pipeline. The SDK itself sits behind the
//! [`DnsApi`] trait; payloads stay opaque JSON.

pub mod api;
pub mod change_batch;
pub mod operations;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types for convenience
pub use api::DnsApi;
pub use change_batch::{
    service_a_record, service_a_record_key, service_record_name, ChangeAction, ChangeBatch,
    DEFAULT_TTL,
};
pub use operations::{ZoneOperations, MALFORMED_RESPONSE};
