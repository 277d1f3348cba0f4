use std::sync::{Mutex, PoisonError};

use crate::domain::RailEvent;
use crate::ports::EventSink;

/// Keeps every event in memory.
#[derive(Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<RailEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RailEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many events with this `RailEvent::name` were emitted.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: RailEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
