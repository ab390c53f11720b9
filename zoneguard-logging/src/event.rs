//! Retry events reported for every attempt of a guarded call

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zoneguard_core::{DnsApiError, ErrorKind};

/// Where in the per-call state machine an event was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// The attempt succeeded and the call is complete
    Succeeded,
    /// The attempt failed and another one is scheduled after a backoff
    Retrying,
    /// The call is complete with a typed error
    Failed,
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPhase::Succeeded => write!(f, "succeeded"),
            ExecutionPhase::Retrying => write!(f, "retrying"),
            ExecutionPhase::Failed => write!(f, "failed"),
        }
    }
}

/// One structured record per attempt outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryEvent {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    /// 1-indexed attempt number
    pub attempt: u32,
    pub phase: ExecutionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Backoff chosen before the next attempt, only set when retrying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RetryEvent {
    pub fn succeeded(operation: impl Into<String>, attempt: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            attempt,
            phase: ExecutionPhase::Succeeded,
            error_kind: None,
            backoff_ms: None,
            message: None,
        }
    }

    pub fn retrying(
        operation: impl Into<String>,
        attempt: u32,
        error: &DnsApiError,
        backoff_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            attempt,
            phase: ExecutionPhase::Retrying,
            error_kind: Some(error.kind),
            backoff_ms: Some(backoff_ms),
            message: Some(error.message.clone()),
        }
    }

    pub fn failed(operation: impl Into<String>, attempt: u32, error: &DnsApiError) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            attempt,
            phase: ExecutionPhase::Failed,
            error_kind: Some(error.kind),
            backoff_ms: None,
            message: Some(error.message.clone()),
        }
    }
}
