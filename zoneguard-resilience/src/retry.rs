//! Rate-limited retry executor

use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use zoneguard_core::{DnsApiError, ErrorClassifier, ErrorKind, RawFailure, Retryable};
use zoneguard_logging::{EventSink, RetryEvent, TracingSink};

use crate::adaptive::{AdaptiveController, AdaptiveSnapshot};
use crate::backoff::BackoffCalculator;
use crate::config::{RateLimitConfig, RetryConfig};
use crate::context::{deadline_after, CallContext};
use crate::error::ResilienceError;
use crate::token_bucket::TokenBucket;

/// Code attached to errors raised once the caller's deadline has passed
pub const DEADLINE_EXCEEDED: &str = "DeadlineExceeded";

/// Code attached to throttle errors raised when no permit arrived in time
pub const PERMIT_TIMEOUT: &str = "PermitTimeout";

/// Progress of a single guarded call, discarded when the call ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub last_error_kind: Option<ErrorKind>,
    pub next_backoff: Option<Duration>,
}

/// Wraps remote calls with permit acquisition, classification and retries
///
/// One executor is meant to be shared by every caller in the process; the
/// bucket and controller it owns are safe under concurrent use.
pub struct RetryExecutor {
    controller: AdaptiveController,
    classifier: ErrorClassifier,
    sink: Arc<dyn EventSink>,
    config: RetryConfig,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("controller", &self.controller)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Create an executor around an explicitly constructed controller
    pub fn new(controller: AdaptiveController, config: RetryConfig) -> Self {
        Self {
            controller,
            classifier: ErrorClassifier::new(),
            sink: Arc::new(TracingSink::new()),
            config,
        }
    }

    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }

    /// Replace the event sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn controller(&self) -> &AdaptiveController {
        &self.controller
    }

    pub fn bucket(&self) -> &Arc<TokenBucket> {
        self.controller.bucket()
    }

    pub fn snapshot(&self) -> AdaptiveSnapshot {
        self.controller.snapshot()
    }

    /// Run `operation` with the executor's default retry configuration
    pub async fn execute<T, F, Fut>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, DnsApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        let ctx = CallContext::new(operation_name);
        self.execute_with(&ctx, &self.config, operation).await
    }

    /// Run `operation` under `ctx`, classifying its raw failures
    pub async fn execute_with<T, F, Fut>(
        &self,
        ctx: &CallContext,
        config: &RetryConfig,
        mut operation: F,
    ) -> Result<T, DnsApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        let classifier = self.classifier;
        self.execute_classified(ctx, config, || {
            let attempt = operation();
            async move { attempt.await.map_err(|raw| classifier.classify(raw)) }
        })
        .await
    }

    /// Retry loop over an operation whose failures are already typed
    ///
    /// Each attempt acquires a permit, invokes the operation and feeds the
    /// outcome to the adaptive controller. Non-retryable errors surface on
    /// first occurrence; retryable ones are retried until `max_attempts`.
    /// Every terminal error carries the number of invocations made.
    pub async fn execute_classified<T, F, Fut>(
        &self,
        ctx: &CallContext,
        config: &RetryConfig,
        mut operation: F,
    ) -> Result<T, DnsApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DnsApiError>>,
    {
        let max_attempts = config.max_attempts.max(1);
        let backoff = BackoffCalculator::new(config.base_backoff, config.max_backoff, config.jitter);
        let mut record = AttemptRecord::default();

        loop {
            record.attempt += 1;
            let attempt = record.attempt;
            let invoked = attempt - 1;

            if ctx.is_expired() {
                let error = deadline_exceeded(ctx, "before acquiring a request permit");
                return Err(self.fail(ctx, attempt, error.with_attempts(invoked)));
            }

            let permit_deadline = deadline_after(Instant::now(), config.timeout_per_attempt);
            let wait_until = ctx
                .deadline()
                .map_or(permit_deadline, |deadline| deadline.min(permit_deadline));

            if !self.bucket().acquire_until(wait_until).await {
                let error = if ctx.is_expired() {
                    deadline_exceeded(ctx, "waiting for a request permit")
                } else {
                    DnsApiError::throttle(format!(
                        "No request permit available within {:?}",
                        config.timeout_per_attempt
                    ))
                    .with_code(PERMIT_TIMEOUT)
                };
                return Err(self.fail(ctx, attempt, error.with_attempts(invoked)));
            }

            debug!(
                "Executing {} attempt {} of {}",
                ctx.operation(),
                attempt,
                max_attempts
            );

            let outcome = match ctx.deadline() {
                Some(deadline) => match timeout_at(deadline, operation()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        let error = deadline_exceeded(ctx, "waiting for the response");
                        return Err(self.fail(ctx, attempt, error.with_attempts(attempt)));
                    }
                },
                None => operation().await,
            };

            let error = match outcome {
                Ok(value) => {
                    self.controller.record_success();
                    if attempt > 1 {
                        info!("{} succeeded after {} attempts", ctx.operation(), attempt);
                    }
                    self.sink.record(&RetryEvent::succeeded(ctx.operation(), attempt));
                    return Ok(value);
                }
                Err(error) => error,
            };

            record.last_error_kind = Some(error.kind);

            if !error.is_retryable() {
                warn!("{} failed with non-retryable error: {}", ctx.operation(), error);
                return Err(self.fail(ctx, attempt, error.with_attempts(attempt)));
            }

            if attempt >= max_attempts {
                warn!(
                    "{} failed after {} attempts: {}",
                    ctx.operation(),
                    attempt,
                    error
                );
                return Err(self.fail(ctx, attempt, error.with_attempts(attempt)));
            }

            if error.is_throttle() {
                self.controller.record_throttle();
            }

            let delay = backoff.calculate_delay(attempt);
            record.next_backoff = Some(delay);

            if let Some(deadline) = ctx.deadline() {
                let resumes_at = Instant::now().checked_add(delay);
                if resumes_at.map_or(true, |resume| resume >= deadline) {
                    let error = deadline_exceeded(ctx, "before the next retry");
                    return Err(self.fail(ctx, attempt, error.with_attempts(attempt)));
                }
            }

            warn!(
                "{} attempt {} failed: {}. Retrying in {:?}",
                ctx.operation(),
                attempt,
                error,
                delay
            );
            debug!("{} retry state: {:?}", ctx.operation(), record);
            self.sink.record(&RetryEvent::retrying(
                ctx.operation(),
                attempt,
                &error,
                delay.as_millis().min(u64::MAX as u128) as u64,
            ));

            sleep(delay).await;
        }
    }

    fn fail(&self, ctx: &CallContext, attempt: u32, error: DnsApiError) -> DnsApiError {
        self.sink.record(&RetryEvent::failed(ctx.operation(), attempt, &error));
        error
    }
}

fn deadline_exceeded(ctx: &CallContext, phase: &str) -> DnsApiError {
    DnsApiError::unknown(
        format!("Deadline exceeded for {} {}", ctx.operation(), phase),
        true,
    )
    .with_code(DEADLINE_EXCEEDED)
}

/// Builder for [`RetryExecutor`]
#[derive(Default)]
pub struct RetryExecutorBuilder {
    rate_limit: RateLimitConfig,
    retry: RetryConfig,
    bucket: Option<Arc<TokenBucket>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl RetryExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Use an existing bucket instead of creating one from the rate limit config
    pub fn bucket(mut self, bucket: Arc<TokenBucket>) -> Self {
        self.bucket = Some(bucket);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<RetryExecutor, ResilienceError> {
        let controller = match self.bucket {
            Some(bucket) => AdaptiveController::new(bucket, self.rate_limit)?,
            None => AdaptiveController::from_config(self.rate_limit)?,
        };

        let executor = RetryExecutor::new(controller, self.retry);
        Ok(match self.sink {
            Some(sink) => executor.with_sink(sink),
            None => executor,
        })
    }
}
