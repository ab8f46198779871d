//! Collection statistics tracking.
//!
//! This module provides thread-safe counters for the events observed while
//! fetching, parsing and delivering records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::EventKind;

/// Thread-safe collection statistics tracker.
///
/// Every [`EventKind`] is initialized to zero on creation, so the counters can
/// be shared across collector tasks behind an `Arc` without further locking.
pub struct CollectionStats {
    events: HashMap<EventKind, AtomicUsize>,
}

impl CollectionStats {
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for kind in EventKind::iter() {
            events.insert(kind, AtomicUsize::new(0));
        }
        CollectionStats { events }
    }

    /// Increments the counter for `kind` by one.
    pub fn increment(&self, kind: EventKind) {
        self.add(kind, 1);
    }

    /// Adds `count` to the counter for `kind`.
    pub fn add(&self, kind: EventKind, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(counter) = self.events.get(&kind) {
            counter.fetch_add(count, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in CollectionStats initialization.",
                kind
            );
        }
    }

    pub fn get(&self, kind: EventKind) -> usize {
        self.events
            .get(&kind)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.events.values().map(|c| c.load(Ordering::Relaxed)).sum()
    }
}

impl Default for CollectionStats {
    fn default() -> Self {
        Self::new()
    }
}
