//! Catalog files.
//!
//! A catalog file lists events in TOML or JSON:
//!
//! ```toml
//! [[events]]
//! event_name = "user_signed_up"
//! event_id_alias = "event_id"
//! event_timestamp_alias = "ts"
//! source_table = "analytics.user_signed_up"
//! entities = [{ entity_name = "user_id", is_default = true }]
//! attributes = [{ attribute_name = "plan", data_type = "string" }]
//! ```
//!
//! `entity_id_alias` defaults to the entity name and `source_alias` to the
//! attribute name.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::{Attribute, CatalogError, EntityRef, Event, InMemoryCatalog};
use crate::types::DataType;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    events: Vec<EventDef>,
}

#[derive(Debug, Deserialize)]
struct EventDef {
    event_name: String,
    event_id_alias: String,
    event_timestamp_alias: String,
    source_table: String,
    #[serde(default)]
    entities: Vec<EntityDef>,
    #[serde(default)]
    attributes: Vec<AttributeDef>,
}

#[derive(Debug, Deserialize)]
struct EntityDef {
    entity_name: String,
    entity_id_alias: Option<String>,
    #[serde(default)]
    is_default: bool,
}

#[derive(Debug, Deserialize)]
struct AttributeDef {
    attribute_name: String,
    data_type: String,
    source_alias: Option<String>,
}

impl EventDef {
    fn into_event(self) -> Result<Event, CatalogError> {
        let entities = self
            .entities
            .into_iter()
            .map(|e| EntityRef {
                entity_id_alias: e.entity_id_alias.unwrap_or_else(|| e.entity_name.clone()),
                entity_name: e.entity_name,
                is_default: e.is_default,
            })
            .collect();

        let attributes = self
            .attributes
            .into_iter()
            .map(|a| {
                let data_type = DataType::from_str(&a.data_type).ok_or_else(|| {
                    CatalogError::UnknownDataType {
                        event: self.event_name.clone(),
                        attribute: a.attribute_name.clone(),
                        data_type: a.data_type.clone(),
                    }
                })?;
                Ok(Attribute {
                    source_alias: a.source_alias.unwrap_or_else(|| a.attribute_name.clone()),
                    attribute_name: a.attribute_name,
                    data_type,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(Event {
            event_name: self.event_name,
            event_id_alias: self.event_id_alias,
            event_timestamp_alias: self.event_timestamp_alias,
            entities,
            attributes,
            source_table: self.source_table,
        })
    }
}

fn build(file: CatalogFile) -> Result<InMemoryCatalog, CatalogError> {
    let events = file
        .events
        .into_iter()
        .map(EventDef::into_event)
        .collect::<Result<Vec<_>, _>>()?;
    InMemoryCatalog::new(events)
}

/// Parse a TOML catalog document.
pub fn parse_catalog_toml(content: &str) -> Result<InMemoryCatalog, CatalogError> {
    build(toml::from_str(content)?)
}

/// Parse a JSON catalog document.
pub fn parse_catalog_json(content: &str) -> Result<InMemoryCatalog, CatalogError> {
    build(serde_json::from_str(content)?)
}

/// Load a catalog file, choosing the format from its extension
/// (`.toml` or `.json`).
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<InMemoryCatalog, CatalogError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let catalog = match extension.as_deref() {
        Some("toml") => parse_catalog_toml(&fs::read_to_string(path)?)?,
        Some("json") => parse_catalog_json(&fs::read_to_string(path)?)?,
        _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
    };

    info!(path = %path.display(), events = catalog.len(), "loaded catalog");
    Ok(catalog)
}
