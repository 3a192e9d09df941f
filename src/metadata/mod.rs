//! Warehouse column metadata.
//!
//! Connections are opened elsewhere. This module owns the part that has to
//! agree with the query language: turning a warehouse's native column types
//! into [`DataType`]s and assembling catalog [`Event`]s from column metadata.
//!
//! ```text
//! ┌──────────────────┐   probe SQL    ┌─────────────────────────┐
//! │ caller's driver  │ ─────────────▶ │ Vec<ColumnMeta>         │
//! └──────────────────┘                └─────────────────────────┘
//!                                                │ Backend::data_type()
//!                                                ▼
//!                                     ┌─────────────────────────┐
//!                                     │ EventBuilder → Event    │
//!                                     └─────────────────────────┘
//! ```
//!
//! Each backend module owns a static table keyed by that backend's type
//! code or type name.

mod bigquery;
mod duckdb;
mod postgres;
mod snowflake;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Attribute, CatalogError, EntityRef, Event};
use crate::types::DataType;

/// Errors raised while mapping warehouse metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Unsupported SQL backend `{0}`. Supported: snowflake, duckdb, postgres, bigquery")]
    UnsupportedBackend(String),

    #[error("Unsupported {backend} type `{native_type}`")]
    UnsupportedType {
        backend: Backend,
        native_type: NativeType,
    },

    #[error("Column `{column}` named as {role} is missing from the query result")]
    MissingColumn { column: String, role: &'static str },

    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] CatalogError),
}

/// Supported warehouse backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Snowflake,
    DuckDb,
    Postgres,
    BigQuery,
}

impl Backend {
    /// Parse a backend name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, MetadataError> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(Backend::Snowflake),
            "duckdb" | "duck" => Ok(Backend::DuckDb),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "bigquery" => Ok(Backend::BigQuery),
            other => Err(MetadataError::UnsupportedBackend(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Snowflake => "snowflake",
            Backend::DuckDb => "duckdb",
            Backend::Postgres => "postgres",
            Backend::BigQuery => "bigquery",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Backend::Snowflake => "Snowflake",
            Backend::DuckDb => "DuckDB",
            Backend::Postgres => "Postgres",
            Backend::BigQuery => "BigQuery",
        }
    }

    /// Map a native column type to its semantic type.
    pub fn data_type(&self, native_type: &NativeType) -> Result<DataType, MetadataError> {
        let mapped = match self {
            Backend::Snowflake => snowflake::data_type(native_type),
            Backend::DuckDb => duckdb::data_type(native_type),
            Backend::Postgres => postgres::data_type(native_type),
            Backend::BigQuery => bigquery::data_type(native_type),
        };
        mapped.ok_or_else(|| MetadataError::UnsupportedType {
            backend: *self,
            native_type: native_type.clone(),
        })
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A backend-specific type key as reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeType {
    /// Numeric type code (Snowflake type code, Postgres OID).
    Code(i64),
    /// Type name (DuckDB, BigQuery, resolved Postgres names).
    Name(String),
}

impl std::fmt::Display for NativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeType::Code(code) => write!(f, "{}", code),
            NativeType::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for NativeType {
    fn from(code: i64) -> Self {
        NativeType::Code(code)
    }
}

impl From<&str> for NativeType {
    fn from(name: &str) -> Self {
        NativeType::Name(name.to_string())
    }
}

/// One column of a probed query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub native_type: NativeType,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, native_type: impl Into<NativeType>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
        }
    }
}

/// SQL a driver runs to learn the columns of `sql` without reading rows.
pub fn metadata_probe_sql(sql: &str) -> String {
    format!("with query as ({}) select * from query where 1=0", sql)
}

/// Builds a catalog [`Event`] from probed column metadata.
///
/// Column names are lower-cased. Every column that is not the event id,
/// the timestamp or an entity id becomes a typed attribute.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until build() is called"]
pub struct EventBuilder {
    backend: Backend,
    event_name: String,
    source_table: String,
    event_id_alias: String,
    event_timestamp_alias: String,
    entities: Vec<EntityRef>,
}

impl EventBuilder {
    pub fn new(backend: Backend, event_name: &str, source_table: &str) -> Self {
        Self {
            backend,
            event_name: event_name.into(),
            source_table: source_table.into(),
            event_id_alias: "event_id".into(),
            event_timestamp_alias: "ts".into(),
            entities: Vec::new(),
        }
    }

    pub fn event_id(mut self, alias: &str) -> Self {
        self.event_id_alias = alias.to_lowercase();
        self
    }

    pub fn timestamp(mut self, alias: &str) -> Self {
        self.event_timestamp_alias = alias.to_lowercase();
        self
    }

    /// Add an entity whose id column has the same name.
    pub fn entity(mut self, name: &str, is_default: bool) -> Self {
        let mut entity = EntityRef::new(name.to_lowercase());
        entity.is_default = is_default;
        self.entities.push(entity);
        self
    }

    pub fn build(self, columns: &[ColumnMeta]) -> Result<Event, MetadataError> {
        let names: Vec<String> = columns.iter().map(|c| c.name.to_lowercase()).collect();

        let required = [
            (&self.event_id_alias, "event id"),
            (&self.event_timestamp_alias, "event timestamp"),
        ];
        for (column, role) in required {
            if !names.contains(column) {
                return Err(MetadataError::MissingColumn {
                    column: column.clone(),
                    role,
                });
            }
        }
        for entity in &self.entities {
            if !names.contains(&entity.entity_id_alias) {
                return Err(MetadataError::MissingColumn {
                    column: entity.entity_id_alias.clone(),
                    role: "entity id",
                });
            }
        }

        let mut event = Event::new(
            &self.event_name,
            &self.event_id_alias,
            &self.event_timestamp_alias,
            &self.source_table,
        );
        event.entities = self.entities.clone();

        for (name, column) in names.iter().zip(columns) {
            let is_key = *name == self.event_id_alias
                || *name == self.event_timestamp_alias
                || self.entities.iter().any(|e| e.entity_id_alias == *name);
            if is_key {
                continue;
            }
            let data_type = self.backend.data_type(&column.native_type)?;
            event.attributes.push(Attribute::new(name.clone(), data_type));
        }

        event.check()?;
        debug!(
            event = %event.event_name,
            backend = self.backend.as_str(),
            attributes = event.attributes.len(),
            "built event from column metadata"
        );
        Ok(event)
    }
}
