//! In-memory catalog backed by a fixed list of events.

use std::collections::HashMap;

use tracing::debug;

use super::{Catalog, CatalogError, Event};

/// Catalog built once from a list of events and never mutated afterwards.
///
/// Events are kept in insertion order; lookups go through a name index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    events: Vec<Event>,
    index: HashMap<String, usize>,
}

impl InMemoryCatalog {
    /// Build a catalog, checking every event's invariants and the
    /// uniqueness of event names.
    pub fn new(events: Vec<Event>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            event.check()?;
            if index.insert(event.event_name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateEvent(event.event_name.clone()));
            }
        }
        debug!(events = events.len(), "built in-memory catalog");
        Ok(Self { events, index })
    }

    /// Assemble a catalog from events already known to be valid.
    pub(crate) fn from_parts(events: Vec<Event>, index: HashMap<String, usize>) -> Self {
        Self { events, index }
    }

    /// Events in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn get_event(&self, name: &str) -> Option<&Event> {
        self.index.get(name).map(|&i| &self.events[i])
    }

    fn list_event_names(&self) -> Vec<String> {
        self.events.iter().map(|e| e.event_name.clone()).collect()
    }
}
