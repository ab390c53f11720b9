use super::EventSink;
use crate::event::{ExecutionPhase, RetryEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Bounded in-memory buffer of the most recent events
///
/// Oldest events are dropped once `capacity` is reached.
pub struct MemorySink {
    capacity: usize,
    events: Mutex<VecDeque<RetryEvent>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Copy of the buffered events, oldest first
    pub fn events(&self) -> Vec<RetryEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn events_for(&self, operation: &str) -> Vec<RetryEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.operation == operation)
            .cloned()
            .collect()
    }

    pub fn count_phase(&self, phase: ExecutionPhase) -> usize {
        self.events.lock().iter().filter(|e| e.phase == phase).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &RetryEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoneguard_core::DnsApiError;

    #[test]
    fn test_memory_sink_is_bounded() {
        let sink = MemorySink::new(2);
        sink.record(&RetryEvent::succeeded("a", 1));
        sink.record(&RetryEvent::succeeded("b", 1));
        sink.record(&RetryEvent::succeeded("c", 1));

        let operations: Vec<_> = sink.events().into_iter().map(|e| e.operation).collect();
        assert_eq!(operations, vec!["b", "c"]);
    }

    #[test]
    fn test_memory_sink_filters() {
        let sink = MemorySink::default();
        let error = DnsApiError::throttle("slow down");
        sink.record(&RetryEvent::retrying("list_records", 1, &error, 200));
        sink.record(&RetryEvent::succeeded("list_records", 2));
        sink.record(&RetryEvent::failed("get_change", 1, &error));

        assert_eq!(sink.events_for("list_records").len(), 2);
        assert_eq!(sink.count_phase(ExecutionPhase::Retrying), 1);
        assert_eq!(sink.count_phase(ExecutionPhase::Failed), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
