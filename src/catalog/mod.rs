//! Event catalog.
//!
//! The catalog is the read-only registry of events the query language can
//! talk about. Parsing never touches it; validation, compilation, hover and
//! completion all resolve names through the [`Catalog`] trait.
//!
//! ```text
//! Event user_logged_in
//!   ├── event_id_alias         event_id
//!   ├── event_timestamp_alias  ts
//!   ├── entities               user_id (default), device_id
//!   ├── attributes             status: string, ...
//!   └── source_table           analytics.user_logged_in
//! ```

pub mod demo;
pub mod loader;
pub mod memory;

pub use loader::{load_catalog, parse_catalog_json, parse_catalog_toml};
pub use memory::InMemoryCatalog;

use std::path::PathBuf;

use serde::Serialize;

use crate::types::DataType;

/// Errors raised while building or loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate event `{0}`")]
    DuplicateEvent(String),

    #[error("event `{0}` must declare at least one entity")]
    NoEntities(String),

    #[error("event `{event}` declares more than one default entity (`{first}` and `{second}`)")]
    MultipleDefaults {
        event: String,
        first: String,
        second: String,
    },

    #[error("Unknown data type `{data_type}` for attribute `{attribute}` on event `{event}`")]
    UnknownDataType {
        event: String,
        attribute: String,
        data_type: String,
    },

    #[error("Unsupported catalog file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named, typed column belonging to an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub attribute_name: String,
    pub data_type: DataType,
    /// Physical column name in the source table.
    pub source_alias: String,
}

impl Attribute {
    /// Attribute whose physical column has the same name.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            source_alias: name.clone(),
            attribute_name: name,
            data_type,
        }
    }

    pub fn with_source_alias(mut self, alias: impl Into<String>) -> Self {
        self.source_alias = alias.into();
        self
    }
}

/// An entity key carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRef {
    pub entity_name: String,
    /// Column holding the entity id.
    pub entity_id_alias: String,
    pub is_default: bool,
}

impl EntityRef {
    /// Entity whose id column has the same name as the entity.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            entity_id_alias: name.clone(),
            entity_name: name,
            is_default: false,
        }
    }

    pub fn with_id_alias(mut self, alias: impl Into<String>) -> Self {
        self.entity_id_alias = alias.into();
        self
    }

    pub fn default_entity(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// The catalog's unit of metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_name: String,
    pub event_id_alias: String,
    pub event_timestamp_alias: String,
    pub entities: Vec<EntityRef>,
    pub attributes: Vec<Attribute>,
    pub source_table: String,
}

/// Where a column name resolved to on an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOrigin {
    Attribute,
    EntityId { entity: String },
    EventId,
    EventTimestamp,
}

impl std::fmt::Display for ColumnOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnOrigin::Attribute => write!(f, "attribute"),
            ColumnOrigin::EntityId { entity } => write!(f, "id of entity {}", entity),
            ColumnOrigin::EventId => write!(f, "event id"),
            ColumnOrigin::EventTimestamp => write!(f, "event timestamp"),
        }
    }
}

/// A column name resolved against an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    /// Physical column in the event's source table.
    pub physical: String,
    pub origin: ColumnOrigin,
    /// Declared type; entity and event ids carry none.
    pub data_type: Option<DataType>,
}

impl Event {
    pub fn new(
        event_name: impl Into<String>,
        event_id_alias: impl Into<String>,
        event_timestamp_alias: impl Into<String>,
        source_table: impl Into<String>,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            event_id_alias: event_id_alias.into(),
            event_timestamp_alias: event_timestamp_alias.into(),
            entities: Vec::new(),
            attributes: Vec::new(),
            source_table: source_table.into(),
        }
    }

    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Check the structural invariants every catalog event must hold.
    pub fn check(&self) -> Result<(), CatalogError> {
        if self.entities.is_empty() {
            return Err(CatalogError::NoEntities(self.event_name.clone()));
        }
        let mut defaults = self.entities.iter().filter(|e| e.is_default);
        if let (Some(first), Some(second)) = (defaults.next(), defaults.next()) {
            return Err(CatalogError::MultipleDefaults {
                event: self.event_name.clone(),
                first: first.entity_name.clone(),
                second: second.entity_name.clone(),
            });
        }
        Ok(())
    }

    pub fn entity(&self, name: &str) -> Option<&EntityRef> {
        self.entities.iter().find(|e| e.entity_name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.attribute_name == name)
    }

    /// The entity flagged `is_default`, if any.
    pub fn default_entity(&self) -> Option<&EntityRef> {
        self.entities.iter().find(|e| e.is_default)
    }

    /// Entity used to pick one row per key when this event is selected:
    /// the default entity, else the first declared one.
    pub fn partition_entity(&self) -> Option<&EntityRef> {
        self.default_entity().or_else(|| self.entities.first())
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.entity_name.clone()).collect()
    }

    /// Attribute names followed by the event-id and timestamp aliases.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.attributes.len() + 2);
        let extra = [&self.event_id_alias, &self.event_timestamp_alias];
        for name in self
            .attributes
            .iter()
            .map(|a| &a.attribute_name)
            .chain(extra)
        {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Every name a column expression may use on this event, in
    /// resolution order, without duplicates.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.attribute_names();
        for entity in &self.entities {
            if !names.contains(&entity.entity_id_alias) {
                names.push(entity.entity_id_alias.clone());
            }
        }
        names
    }

    /// Resolve a column name: attribute, then entity id, then event id,
    /// then event timestamp.
    pub fn resolve_column(&self, name: &str) -> Option<ResolvedColumn> {
        if let Some(attr) = self.attribute(name) {
            return Some(ResolvedColumn {
                physical: attr.source_alias.clone(),
                origin: ColumnOrigin::Attribute,
                data_type: Some(attr.data_type),
            });
        }
        if let Some(entity) = self.entities.iter().find(|e| e.entity_id_alias == name) {
            return Some(ResolvedColumn {
                physical: entity.entity_id_alias.clone(),
                origin: ColumnOrigin::EntityId {
                    entity: entity.entity_name.clone(),
                },
                data_type: None,
            });
        }
        if name == self.event_id_alias {
            return Some(ResolvedColumn {
                physical: self.event_id_alias.clone(),
                origin: ColumnOrigin::EventId,
                data_type: None,
            });
        }
        if name == self.event_timestamp_alias {
            return Some(ResolvedColumn {
                physical: self.event_timestamp_alias.clone(),
                origin: ColumnOrigin::EventTimestamp,
                data_type: Some(DataType::Timestamp),
            });
        }
        None
    }

    /// One-line description used by hover and the CLI.
    pub fn summary(&self) -> String {
        let entities: Vec<String> = self
            .entities
            .iter()
            .map(|e| {
                if e.is_default {
                    format!("{} (default)", e.entity_name)
                } else {
                    e.entity_name.clone()
                }
            })
            .collect();
        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|a| format!("{}: {}", a.attribute_name, a.data_type))
            .collect();
        format!(
            "event {}: entities [{}]; attributes [{}]",
            self.event_name,
            entities.join(", "),
            attributes.join(", ")
        )
    }
}

/// Read-only registry of events.
///
/// Implementations must keep listing order stable (insertion order) so
/// completion output is deterministic.
pub trait Catalog: Send + Sync {
    /// Look up an event by name.
    fn get_event(&self, name: &str) -> Option<&Event>;

    /// All event names, in insertion order.
    fn list_event_names(&self) -> Vec<String>;

    /// Entity names of an event; empty if the event is unknown.
    fn list_entity_names(&self, event_name: &str) -> Vec<String> {
        self.get_event(event_name)
            .map(Event::entity_names)
            .unwrap_or_default()
    }

    /// Attribute names of an event including its id and timestamp aliases;
    /// empty if the event is unknown.
    fn list_attribute_names(&self, event_name: &str) -> Vec<String> {
        self.get_event(event_name)
            .map(Event::attribute_names)
            .unwrap_or_default()
    }
}
