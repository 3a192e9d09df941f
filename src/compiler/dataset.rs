//! The resolved form of a query.
//!
//! A [`Dataset`] holds everything needed to render SQL: the catalog events
//! involved (copied, so no catalog is needed afterwards), the physical
//! column behind every alias, and the join keys. Build one with
//! [`compile_to_dataset`](super::compile_to_dataset).

use serde::Serialize;

use crate::catalog::Event;
use crate::dsl::ast::{AggregateFunction, CompareOp, JoinQualifier, Literal, SelectorKind};
use crate::sql::Layout;

use super::emit;

/// One base selection plus the events joined onto it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub base_event: BaseEvent,
    /// Joins in declaration order.
    pub joined_events: Vec<JoinedEvent>,
}

impl Dataset {
    /// Render as formatted SQL, one clause per line.
    pub fn to_sql(&self) -> String {
        emit::to_query(self).to_sql(Layout::Pretty)
    }

    /// Render as single-line SQL.
    pub fn to_sql_compact(&self) -> String {
        emit::to_query(self).to_sql(Layout::Compact)
    }
}

/// The event whose selected row anchors every output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseEvent {
    pub event: Event,
    /// `First` or `Last`.
    #[serde(serialize_with = "serialize_selector")]
    pub selector: SelectorKind,
    /// Physical column rows are partitioned by before ranking.
    pub partition_key: String,
    pub columns: Vec<BaseColumn>,
}

/// `alias ← source_column` on the base event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseColumn {
    pub alias: String,
    pub source_column: String,
    pub physical: String,
}

/// An event joined to the base row through shared entity keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedEvent {
    pub event: Event,
    #[serde(serialize_with = "serialize_qualifier")]
    pub qualifier: JoinQualifier,
    #[serde(serialize_with = "serialize_selector")]
    pub selector: SelectorKind,
    /// Entity names matched on, from `using` or the event's default entity.
    pub using_entities: Vec<String>,
    pub keys: Vec<JoinKey>,
    pub columns: Vec<JoinedColumn>,
    pub filter: Option<Filter>,
}

/// Equality between a joined-event column and a base-event column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinKey {
    pub entity: String,
    pub joined_column: String,
    pub base_column: String,
}

/// One output column of a join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedColumn {
    pub alias: String,
    pub value: ColumnValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnValue {
    /// The column's value on the selected (or grouped) row.
    Reference {
        source_column: String,
        physical: String,
    },
    /// An aggregate over every matching row.
    Aggregation {
        #[serde(serialize_with = "serialize_function")]
        function: AggregateFunction,
        argument_column: String,
        physical: String,
    },
}

/// `column op literal` on the joined event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub column: String,
    pub physical: String,
    #[serde(serialize_with = "serialize_operator")]
    pub operator: CompareOp,
    #[serde(serialize_with = "serialize_literal")]
    pub literal: Literal,
}

fn serialize_selector<S: serde::Serializer>(kind: &SelectorKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(kind.as_str())
}

fn serialize_qualifier<S: serde::Serializer>(q: &JoinQualifier, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(q.as_str())
}

fn serialize_function<S: serde::Serializer>(
    f: &AggregateFunction,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(f.as_str())
}

fn serialize_operator<S: serde::Serializer>(op: &CompareOp, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(op.as_str())
}

fn serialize_literal<S: serde::Serializer>(lit: &Literal, s: S) -> Result<S::Ok, S::Error> {
    match lit {
        Literal::String(v) => s.serialize_str(v),
        Literal::Integer(n) => s.serialize_i64(*n),
        Literal::Float(x) => s.serialize_f64(*x),
    }
}
