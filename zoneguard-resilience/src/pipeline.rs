//! Ordered stage pipeline around a remote operation
//!
//! Each stage wraps the rest of the chain, so cross-cutting behaviour such as
//! logging or retries attaches without touching the other stages. Stages run
//! outer to inner in insertion order; the innermost step invokes the
//! operation and classifies its raw failure.

use async_trait::async_trait;
use futures::future::BoxFuture;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::Instant;
use zoneguard_core::{DnsApiError, ErrorClassifier, RawFailure};

use crate::context::CallContext;
use crate::retry::RetryExecutor;

/// Future produced by one invocation of a remote operation
pub type OperationFuture<T> = BoxFuture<'static, Result<T, RawFailure>>;

/// Re-invocable remote operation
pub type Operation<'a, T> = dyn Fn() -> OperationFuture<T> + Send + Sync + 'a;

/// One link in the pipeline
#[async_trait]
pub trait Stage<T: Send + 'static>: Send + Sync {
    /// Handle the call, delegating to `next` zero or more times
    async fn handle(&self, ctx: &CallContext, next: Next<'_, T>) -> Result<T, DnsApiError>;

    fn name(&self) -> &'static str;
}

/// The remainder of the pipeline after the current stage
pub struct Next<'a, T> {
    stages: &'a [Arc<dyn Stage<T>>],
    operation: &'a Operation<'a, T>,
    classifier: ErrorClassifier,
}

impl<T> Clone for Next<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Next<'_, T> {}

impl<T: Send + 'static> Next<'_, T> {
    /// Run the remaining stages, or the operation itself when none are left
    pub async fn run(self, ctx: &CallContext) -> Result<T, DnsApiError> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    operation: self.operation,
                    classifier: self.classifier,
                };
                stage.handle(ctx, next).await
            }
            None => (self.operation)()
                .await
                .map_err(|raw| self.classifier.classify(raw)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

/// Ordered chain of stages
pub struct Pipeline<T> {
    stages: Vec<Arc<dyn Stage<T>>>,
    classifier: ErrorClassifier,
}

impl<T: Send + 'static> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Pipeline<T> {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            classifier: ErrorClassifier::new(),
        }
    }

    /// Append a stage inside the ones already added
    pub fn stage<S>(self, stage: S) -> Self
    where
        S: Stage<T> + 'static,
    {
        self.shared_stage(Arc::new(stage))
    }

    /// Append a stage that is shared with other pipelines
    pub fn shared_stage(mut self, stage: Arc<dyn Stage<T>>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub async fn run<F>(&self, ctx: &CallContext, operation: F) -> Result<T, DnsApiError>
    where
        F: Fn() -> OperationFuture<T> + Send + Sync,
    {
        let next = Next {
            stages: &self.stages,
            operation: &operation,
            classifier: self.classifier,
        };
        next.run(ctx).await
    }
}

#[async_trait]
impl<T: Send + 'static> Stage<T> for RetryExecutor {
    async fn handle(&self, ctx: &CallContext, next: Next<'_, T>) -> Result<T, DnsApiError> {
        self.execute_classified(ctx, self.config(), || next.run(ctx))
            .await
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}

/// Logs the start, duration and outcome of every call
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingStage;

#[async_trait]
impl<T: Send + 'static> Stage<T> for LoggingStage {
    async fn handle(&self, ctx: &CallContext, next: Next<'_, T>) -> Result<T, DnsApiError> {
        let started = Instant::now();
        debug!("Starting {}", ctx.operation());

        let result = next.run(ctx).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(_) => info!("{} completed in {:?}", ctx.operation(), elapsed),
            Err(error) => warn!("{} failed in {:?}: {}", ctx.operation(), elapsed, error),
        }
        result
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}
