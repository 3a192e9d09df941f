//! Small built-in catalog used by the CLI when nothing is configured.

use super::{Attribute, EntityRef, Event, InMemoryCatalog};
use crate::types::DataType;

fn demo_events() -> Vec<Event> {
    vec![
        Event::new("user_signed_up", "event_id", "ts", "user_signed_up")
            .with_entity(EntityRef::new("user_id").default_entity())
            .with_attribute(Attribute::new("plan", DataType::String))
            .with_attribute(Attribute::new("country", DataType::String)),
        Event::new("user_logged_in", "event_id", "ts", "user_logged_in")
            .with_entity(EntityRef::new("entity_1"))
            .with_entity(EntityRef::new("entity_2"))
            .with_entity(EntityRef::new("user_id").default_entity())
            .with_attribute(Attribute::new("status", DataType::String))
            .with_attribute(Attribute::new("device", DataType::String)),
        Event::new("order_placed", "event_id", "ts", "order_placed")
            .with_entity(EntityRef::new("user_id").default_entity())
            .with_entity(EntityRef::new("order_id"))
            .with_attribute(Attribute::new("amount", DataType::Float))
            .with_attribute(Attribute::new("currency", DataType::String))
            .with_attribute(Attribute::new("is_gift", DataType::Boolean)),
    ]
}

/// Build the demo catalog: `user_signed_up`, `user_logged_in` and
/// `order_placed`, all keyed by `user_id`.
pub fn build() -> InMemoryCatalog {
    // The fixed event list always satisfies the catalog invariants.
    let events = demo_events();
    let index = events
        .iter()
        .enumerate()
        .map(|(i, e)| (e.event_name.clone(), i))
        .collect();
    InMemoryCatalog::from_parts(events, index)
}
