//! # EEQL
//!
//! An event query language: every query is tied to an entity and reads one
//! row per entity from a base event, enriched with columns from events that
//! happened before or after it.
//!
//! ```text
//! select first user_signed_up(user_id as user_id, country as country)
//! join after first user_logged_in(status as first_status)
//! join after order_placed(count(order_id) as orders)
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Query text                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dsl]         span-tracking parser
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Query (AST)                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validation]  checked against a Catalog
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Validated Query                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler]    lowering
//! ┌─────────────────────────────────────────────────────────┐
//! │        Dataset (base event + ordered joined events)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]         token-stream rendering
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SQL Query                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`lsp`] module runs the first two stages on every keystroke to
//! produce diagnostics, completions and hover text.

pub mod catalog;
pub mod compile;
pub mod compiler;
pub mod config;
pub mod dsl;
pub mod lsp;
pub mod metadata;
pub mod sql;
pub mod types;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Catalog, Event, InMemoryCatalog};
    pub use crate::compile::{compile, compile_dataset, CompileError, CompileOptions, CompileOutput};
    pub use crate::compiler::{compile_to_dataset, Dataset};
    pub use crate::dsl::{parse_with_spans, Position, Query, Span};
    pub use crate::types::DataType;
    pub use crate::validation::validate_query;
}

pub use catalog::{Catalog, InMemoryCatalog};
pub use compile::{compile, CompileOptions};
pub use compiler::Dataset;
pub use dsl::parse_with_spans;
pub use validation::validate_query;
