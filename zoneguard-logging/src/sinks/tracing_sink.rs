use super::EventSink;
use crate::event::{ExecutionPhase, RetryEvent};

/// Emits each event through `tracing` with structured fields
///
/// Successes log at debug, retries at warn and terminal failures at error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn record(&self, event: &RetryEvent) {
        let error_kind = event.error_kind.map(|k| k.as_str()).unwrap_or("none");
        let backoff_ms = event.backoff_ms.unwrap_or(0);
        let message = event.message.as_deref().unwrap_or("");
        let timestamp = event.timestamp.to_rfc3339();

        match event.phase {
            ExecutionPhase::Succeeded => tracing::debug!(
                target: "zoneguard::retry",
                timestamp = %timestamp,
                operation = %event.operation,
                attempt = event.attempt,
                "operation succeeded"
            ),
            ExecutionPhase::Retrying => tracing::warn!(
                target: "zoneguard::retry",
                timestamp = %timestamp,
                operation = %event.operation,
                attempt = event.attempt,
                error_kind,
                backoff_ms,
                "attempt failed, retrying: {}",
                message
            ),
            ExecutionPhase::Failed => tracing::error!(
                target: "zoneguard::retry",
                timestamp = %timestamp,
                operation = %event.operation,
                attempt = event.attempt,
                error_kind,
                "operation failed: {}",
                message
            ),
        }
    }
}
