//! Resilience layer for zoneguard
//!
//! This crate keeps calls to a quota-enforcing DNS-management API within
//! quota: a permit bucket paces requests, an adaptive controller tunes the
//! bucket's refill rate from throttle feedback, and a retry executor retries
//! throttled and transient failures with exponential backoff. The executor is
//! also a stage in a composable call pipeline.

pub mod adaptive;
pub mod backoff;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod token_bucket;

// Re-export commonly used types
pub use adaptive::{AdaptiveController, AdaptiveSnapshot};
pub use backoff::{BackoffCalculator, Jitter};
pub use config::{RateLimitConfig, RetryConfig};
pub use context::CallContext;
pub use error::ResilienceError;
pub use pipeline::{LoggingStage, Next, Operation, OperationFuture, Pipeline, Stage};
pub use retry::{
    AttemptRecord, RetryExecutor, RetryExecutorBuilder, DEADLINE_EXCEEDED, PERMIT_TIMEOUT,
};
pub use token_bucket::TokenBucket;
