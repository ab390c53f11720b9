//! Structured logging for zoneguard
//!
//! This crate provides:
//! - Typed retry events describing each attempt of a guarded call
//! - Pluggable event sinks (tracing, in-memory, fan-out)
//! - Tracing subscriber initialisation from configuration

pub mod config;
pub mod event;
pub mod init;
pub mod sinks;

// Re-export main types for convenience
pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use event::{ExecutionPhase, RetryEvent};
pub use init::{init_from_config, init_simple_tracing};
pub use sinks::{EventSink, FanoutSink, MemorySink, NullSink, TracingSink};
