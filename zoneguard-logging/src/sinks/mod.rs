//! Destinations for retry events

pub mod memory;
pub mod tracing_sink;

pub use memory::MemorySink;
pub use tracing_sink::TracingSink;

use crate::event::RetryEvent;
use std::sync::Arc;

/// Trait for retry event destinations
pub trait EventSink: Send + Sync {
    /// Record one event; implementations must not block
    fn record(&self, event: &RetryEvent);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &RetryEvent) {}
}

/// Forwards each event to several sinks in order
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: &RetryEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
