//! Lowering validated queries to a [`Dataset`] and rendering SQL.
//!
//! ```text
//! ┌──────────────┐  compile_to_dataset   ┌──────────────┐  to_sql   ┌──────────┐
//! │ Query (AST)  │ ────────────────────▶ │   Dataset    │ ────────▶ │ SQL text │
//! └──────────────┘      + Catalog        └──────────────┘           └──────────┘
//! ```
//!
//! Lowering resolves every name against the catalog once. Rendering is pure
//! and deterministic: the same dataset always produces the same text.

mod dataset;
mod emit;

pub use dataset::{
    BaseColumn, BaseEvent, ColumnValue, Dataset, Filter, JoinKey, JoinedColumn, JoinedEvent,
};

use tracing::debug;

use crate::catalog::{Catalog, EntityRef, Event};
use crate::dsl::ast::*;
use crate::dsl::Spanned;
use crate::validation::{is_key_column, join_keys};

/// A query reached the compiler without passing validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoweringError {
    #[error("Unknown event `{0}`")]
    UnknownEvent(String),

    #[error("event `{0}` must specify a selector (first/last)")]
    MissingSelector(String),

    #[error("Unknown column `{column}` on event `{event}`")]
    UnknownColumn { event: String, column: String },

    #[error("Unknown entity `{entity}` on event `{event}`")]
    UnknownEntity { event: String, entity: String },

    #[error("Event `{0}` has no entity to partition by")]
    NoPartitionEntity(String),

    #[error("join on `{0}` has no key entity")]
    NoJoinKey(String),

    #[error("select on `{event}` does not support aggregated column `{alias}`")]
    AggregationInSelect { event: String, alias: String },

    #[error("join on `{event}` requires aggregated column for `{alias}` when no selector is specified")]
    UngroupedColumn { event: String, alias: String },

    #[error("Filter literal `{0}` is not a finite number")]
    NonFiniteLiteral(String),

    #[error("alias `{0}` uses the reserved prefix `{prefix}`", prefix = RESERVED_ALIAS_PREFIX)]
    ReservedAlias(String),
}

pub type LoweringResult<T> = Result<T, LoweringError>;

/// Prefix of the helper columns the generated SQL adds. Output aliases may
/// not start with it.
pub const RESERVED_ALIAS_PREFIX: &str = "__eeql_";

fn output_alias(alias: &Spanned<String>) -> LoweringResult<String> {
    if alias.value.starts_with(RESERVED_ALIAS_PREFIX) {
        return Err(LoweringError::ReservedAlias(alias.value.clone()));
    }
    Ok(alias.value.clone())
}

/// Lower a validated query.
///
/// Every name is re-resolved against `catalog`; anything validation would
/// have rejected comes back as a [`LoweringError`].
pub fn compile_to_dataset<C: Catalog + ?Sized>(
    query: &Query,
    catalog: &C,
) -> LoweringResult<Dataset> {
    let base_event = lower_select(&query.select, catalog)?;
    let joined_events = query
        .joins
        .iter()
        .map(|join| lower_join(join, &base_event.event, catalog))
        .collect::<LoweringResult<Vec<_>>>()?;

    debug!(
        base = %base_event.event.event_name,
        joins = joined_events.len(),
        "lowered query to dataset"
    );
    Ok(Dataset {
        base_event,
        joined_events,
    })
}

fn lookup<'c, C: Catalog + ?Sized>(catalog: &'c C, name: &str) -> LoweringResult<&'c Event> {
    catalog
        .get_event(name)
        .ok_or_else(|| LoweringError::UnknownEvent(name.to_string()))
}

fn physical(event: &Event, column: &str) -> LoweringResult<String> {
    event
        .resolve_column(column)
        .map(|c| c.physical)
        .ok_or_else(|| LoweringError::UnknownColumn {
            event: event.event_name.clone(),
            column: column.to_string(),
        })
}

fn lower_select<C: Catalog + ?Sized>(select: &SelectClause, catalog: &C) -> LoweringResult<BaseEvent> {
    let event = lookup(catalog, &select.event_name.value)?;

    if select.selector.is_omitted() {
        return Err(LoweringError::MissingSelector(event.event_name.clone()));
    }

    let partition_key = event
        .partition_entity()
        .map(|e| e.entity_id_alias.clone())
        .ok_or_else(|| LoweringError::NoPartitionEntity(event.event_name.clone()))?;

    let columns = select
        .columns
        .iter()
        .map(|column| match column {
            ColumnExpr::Reference {
                source_column,
                alias,
                ..
            } => Ok(BaseColumn {
                alias: output_alias(alias)?,
                source_column: source_column.value.clone(),
                physical: physical(event, &source_column.value)?,
            }),
            ColumnExpr::Aggregation { alias, .. } => Err(LoweringError::AggregationInSelect {
                event: event.event_name.clone(),
                alias: alias.value.clone(),
            }),
        })
        .collect::<LoweringResult<Vec<_>>>()?;

    Ok(BaseEvent {
        event: event.clone(),
        selector: select.selector.kind,
        partition_key,
        columns,
    })
}

fn lower_join<C: Catalog + ?Sized>(
    join: &JoinClause,
    base: &Event,
    catalog: &C,
) -> LoweringResult<JoinedEvent> {
    let event = lookup(catalog, &join.event_name.value)?;

    for name in &join.using_entities {
        if event.entity(&name.value).is_none() {
            return Err(LoweringError::UnknownEntity {
                event: event.event_name.clone(),
                entity: name.value.clone(),
            });
        }
    }

    let key_entities = join_keys(join, event);
    if key_entities.is_empty() {
        return Err(LoweringError::NoJoinKey(event.event_name.clone()));
    }
    let keys = key_entities
        .iter()
        .map(|entity| {
            let on_base = base
                .entity(&entity.entity_name)
                .ok_or_else(|| LoweringError::UnknownEntity {
                    event: base.event_name.clone(),
                    entity: entity.entity_name.clone(),
                })?;
            Ok(JoinKey {
                entity: entity.entity_name.clone(),
                joined_column: entity.entity_id_alias.clone(),
                base_column: on_base.entity_id_alias.clone(),
            })
        })
        .collect::<LoweringResult<Vec<_>>>()?;

    let columns = join
        .columns
        .iter()
        .map(|column| lower_joined_column(column, join, event, &key_entities))
        .collect::<LoweringResult<Vec<_>>>()?;

    let filter = join
        .filter
        .as_ref()
        .map(|filter| lower_filter(filter, event))
        .transpose()?;

    Ok(JoinedEvent {
        event: event.clone(),
        qualifier: join.qualifier.value,
        selector: join.selector.kind,
        using_entities: keys.iter().map(|k| k.entity.clone()).collect(),
        keys,
        columns,
        filter,
    })
}

fn lower_joined_column(
    column: &ColumnExpr,
    join: &JoinClause,
    event: &Event,
    keys: &[&EntityRef],
) -> LoweringResult<JoinedColumn> {
    let value = match column {
        ColumnExpr::Reference { source_column, .. } => {
            let resolved = event.resolve_column(&source_column.value).ok_or_else(|| {
                LoweringError::UnknownColumn {
                    event: event.event_name.clone(),
                    column: source_column.value.clone(),
                }
            })?;
            if join.selector.is_omitted() && !is_key_column(&source_column.value, keys) {
                return Err(LoweringError::UngroupedColumn {
                    event: event.event_name.clone(),
                    alias: column.alias().value.clone(),
                });
            }
            ColumnValue::Reference {
                source_column: source_column.value.clone(),
                physical: resolved.physical,
            }
        }
        ColumnExpr::Aggregation {
            function,
            argument_column,
            ..
        } => ColumnValue::Aggregation {
            function: function.value,
            argument_column: argument_column.value.clone(),
            physical: physical(event, &argument_column.value)?,
        },
    };
    Ok(JoinedColumn {
        alias: output_alias(column.alias())?,
        value,
    })
}

fn lower_filter(filter: &FilterExpr, event: &Event) -> LoweringResult<Filter> {
    if let Literal::Float(x) = filter.literal.value {
        if !x.is_finite() {
            return Err(LoweringError::NonFiniteLiteral(x.to_string()));
        }
    }
    Ok(Filter {
        column: filter.column.value.clone(),
        physical: physical(event, &filter.column.value)?,
        operator: filter.operator.value,
        literal: filter.literal.value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{demo, Attribute, InMemoryCatalog};
    use crate::dsl::parse_with_spans;
    use crate::types::DataType;

    fn lower(text: &str) -> LoweringResult<Dataset> {
        let query = parse_with_spans(text).expect("query should parse");
        compile_to_dataset(&query, &demo::build())
    }

    #[test]
    fn test_lower_base_event() {
        let dataset = lower("select last user_signed_up ( user_id as uid, ts as signed_up_at )").unwrap();
        let base = &dataset.base_event;

        assert_eq!(base.event.event_name, "user_signed_up");
        assert_eq!(base.selector, SelectorKind::Last);
        assert_eq!(base.partition_key, "user_id");
        assert_eq!(base.columns[1].alias, "signed_up_at");
        assert_eq!(base.columns[1].physical, "ts");
        assert!(dataset.joined_events.is_empty());
    }

    #[test]
    fn test_lower_join_defaults_to_default_entity() {
        let dataset = lower(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( count(event_id) as n, filter(status != 'failed') )",
        )
        .unwrap();
        let join = &dataset.joined_events[0];

        assert_eq!(join.qualifier, JoinQualifier::After);
        assert_eq!(join.selector, SelectorKind::Omitted);
        assert_eq!(join.using_entities, vec!["user_id"]);
        assert_eq!(
            join.keys,
            vec![JoinKey {
                entity: "user_id".into(),
                joined_column: "user_id".into(),
                base_column: "user_id".into(),
            }]
        );
        let filter = join.filter.as_ref().unwrap();
        assert_eq!(filter.operator, CompareOp::NotEq);
        assert!(matches!(
            join.columns[0].value,
            ColumnValue::Aggregation {
                function: AggregateFunction::Count,
                ..
            }
        ));
    }

    #[test]
    fn test_joins_keep_declaration_order() {
        let dataset = lower(
            "select first user_signed_up ( plan as plan ) \
             join after order_placed ( sum(amount) as spent ) \
             join before last user_logged_in ( device as device ) \
             join after first order_placed ( currency as first_currency )",
        )
        .unwrap();
        let names: Vec<_> = dataset
            .joined_events
            .iter()
            .map(|j| j.event.event_name.as_str())
            .collect();
        assert_eq!(names, vec!["order_placed", "user_logged_in", "order_placed"]);
    }

    #[test]
    fn test_unvalidated_queries_fail_loudly() {
        assert_eq!(
            lower("select first ghost ( a as a )").unwrap_err(),
            LoweringError::UnknownEvent("ghost".into())
        );
        assert_eq!(
            lower("select user_signed_up ( plan as plan )").unwrap_err(),
            LoweringError::MissingSelector("user_signed_up".into())
        );
        assert!(matches!(
            lower(
                "select first user_signed_up ( plan as plan ) \
                 join after user_logged_in ( device as device )"
            ),
            Err(LoweringError::UngroupedColumn { .. })
        ));
        assert!(matches!(
            lower(
                "select first user_signed_up ( plan as plan ) \
                 join after user_logged_in ( using entity_1 count(event_id) as n )"
            ),
            Err(LoweringError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_key_column_declared_as_attribute_lowers_under_omitted_selector() {
        let catalog = InMemoryCatalog::new(vec![
            Event::new("user_signed_up", "event_id", "ts", "user_signed_up")
                .with_entity(EntityRef::new("user_id").default_entity()),
            Event::new("user_logged_in", "event_id", "ts", "user_logged_in")
                .with_entity(EntityRef::new("user_id").default_entity())
                .with_attribute(Attribute::new("user_id", DataType::String))
                .with_attribute(Attribute::new("status", DataType::String)),
        ])
        .unwrap();
        let query = parse_with_spans(
            "select first user_signed_up ( user_id as user_id ) \
             join after user_logged_in ( using user_id user_id as uid, count(event_id) as n )",
        )
        .unwrap();

        let dataset = compile_to_dataset(&query, &catalog).unwrap();
        let join = &dataset.joined_events[0];
        assert_eq!(join.columns[0].alias, "uid");
        assert_eq!(
            join.columns[0].value,
            ColumnValue::Reference {
                source_column: "user_id".into(),
                physical: "user_id".into(),
            }
        );

        // status is an attribute but not a key.
        let query = parse_with_spans(
            "select first user_signed_up ( user_id as user_id ) \
             join after user_logged_in ( status as status, count(event_id) as n )",
        )
        .unwrap();
        assert!(matches!(
            compile_to_dataset(&query, &catalog),
            Err(LoweringError::UngroupedColumn { .. })
        ));
    }

    #[test]
    fn test_reserved_alias_prefix_rejected() {
        assert_eq!(
            lower("select first user_signed_up ( plan as __eeql_rn )").unwrap_err(),
            LoweringError::ReservedAlias("__eeql_rn".into())
        );
        assert_eq!(
            lower(
                "select first user_signed_up ( plan as plan ) \
                 join after user_logged_in ( count(event_id) as __eeql_base_key )"
            )
            .unwrap_err(),
            LoweringError::ReservedAlias("__eeql_base_key".into())
        );
        assert_eq!(
            LoweringError::ReservedAlias("__eeql_x".into()).to_string(),
            "alias `__eeql_x` uses the reserved prefix `__eeql_`"
        );
    }
}
