//! Semantic validation of parsed queries against a catalog.
//!
//! Checks, for the select clause and then each join in order:
//! - the event exists
//! - the base clause names a selector
//! - join keys resolve on both the joined and the base event
//! - every column and filter column resolves on its event
//! - joins without a selector aggregate every non-key column
//! - no output alias uses the reserved `__eeql_` prefix
//!
//! Validation stops at the first violation.

use tracing::debug;

use crate::catalog::{Catalog, EntityRef, Event};
use crate::compiler::RESERVED_ALIAS_PREFIX;
use crate::dsl::ast::*;
use crate::dsl::span::{Span, Spanned};

/// A well-formed query that does not fit the catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub span: Span,
}

impl ValidationError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a query against a catalog.
///
/// # Example
///
/// ```
/// use eeql::{catalog, dsl, validation};
///
/// let catalog = catalog::demo::build();
/// let query = dsl::parse_with_spans("select first user_signed_up ( plan as plan )").unwrap();
/// assert!(validation::validate_query(&query, &catalog).is_ok());
/// ```
pub fn validate_query<C: Catalog + ?Sized>(query: &Query, catalog: &C) -> ValidationResult<()> {
    let result = Validator { catalog }.validate(query);
    if let Err(err) = &result {
        debug!(error = %err.message, span = %err.span, "validation failed");
    }
    result
}

/// Entities a join matches on: its `using` list, or the joined event's
/// default entity when the list is empty.
///
/// Names that do not resolve on `event` are skipped; the validator reports
/// them before this is relied on.
pub fn join_keys<'a>(join: &JoinClause, event: &'a Event) -> Vec<&'a EntityRef> {
    if join.using_entities.is_empty() {
        event.default_entity().into_iter().collect()
    } else {
        join.using_entities
            .iter()
            .filter_map(|name| event.entity(&name.value))
            .collect()
    }
}

struct Validator<'c, C: ?Sized> {
    catalog: &'c C,
}

impl<'c, C: Catalog + ?Sized> Validator<'c, C> {
    fn validate(&self, query: &Query) -> ValidationResult<()> {
        let base = self.validate_select(&query.select)?;
        for join in &query.joins {
            self.validate_join(join, base)?;
        }
        Ok(())
    }

    // ========================================================================
    // Clauses
    // ========================================================================

    fn validate_select(&self, select: &SelectClause) -> ValidationResult<&'c Event> {
        let event = self.event(&select.event_name)?;

        if select.selector.is_omitted() {
            return Err(ValidationError::new(
                select.event_name.span,
                format!(
                    "event `{}` must specify a selector (first/last)",
                    event.event_name
                ),
            ));
        }

        for column in &select.columns {
            output_alias(column.alias())?;
            if column.is_aggregation() {
                return Err(ValidationError::new(
                    column.span(),
                    format!(
                        "select on `{}` does not support aggregated column `{}`",
                        event.event_name,
                        column.alias().value
                    ),
                ));
            }
            self.column(event, column.input_column())?;
        }
        Ok(event)
    }

    fn validate_join(&self, join: &JoinClause, base: &Event) -> ValidationResult<()> {
        let event = self.event(&join.event_name)?;

        let keys = self.validate_keys(join, event, base)?;

        for column in &join.columns {
            output_alias(column.alias())?;
            self.column(event, column.input_column())?;
        }

        if join.selector.is_omitted() {
            for column in &join.columns {
                if let ColumnExpr::Reference { source_column, .. } = column {
                    if !is_key_column(&source_column.value, &keys) {
                        return Err(ValidationError::new(
                            column.span(),
                            format!(
                                "join on `{}` requires aggregated column for `{}` when no selector is specified",
                                event.event_name,
                                column.alias().value
                            ),
                        ));
                    }
                }
            }
        }

        if let Some(filter) = &join.filter {
            self.column(event, &filter.column)?;
        }
        Ok(())
    }

    /// Resolve the join keys on the joined event, then check the base event
    /// carries every one of them.
    fn validate_keys(
        &self,
        join: &JoinClause,
        event: &'c Event,
        base: &Event,
    ) -> ValidationResult<Vec<&'c EntityRef>> {
        // (entity name, span to report a missing base key at)
        let mut requested: Vec<(&str, Span)> = Vec::new();

        if join.using_entities.is_empty() {
            let Some(default) = event.default_entity() else {
                return Err(ValidationError::new(
                    join.event_name.span,
                    format!(
                        "join on `{}` needs a using clause: event has no default entity",
                        event.event_name
                    ),
                ));
            };
            requested.push((default.entity_name.as_str(), join.event_name.span));
        } else {
            for entity in &join.using_entities {
                if event.entity(&entity.value).is_none() {
                    return Err(unknown_entity(entity, &event.event_name));
                }
                requested.push((entity.value.as_str(), entity.span));
            }
        }

        for (name, span) in requested {
            if base.entity(name).is_none() {
                return Err(ValidationError::new(
                    span,
                    format!("Unknown entity `{}` on event `{}`", name, base.event_name),
                ));
            }
        }

        Ok(join_keys(join, event))
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    fn event(&self, name: &Spanned<String>) -> ValidationResult<&'c Event> {
        self.catalog.get_event(&name.value).ok_or_else(|| {
            ValidationError::new(name.span, format!("Unknown event `{}`", name.value))
        })
    }

    fn column(&self, event: &Event, column: &Spanned<String>) -> ValidationResult<()> {
        match event.resolve_column(&column.value) {
            Some(_) => Ok(()),
            None => Err(ValidationError::new(
                column.span,
                format!(
                    "Unknown column `{}` on event `{}`",
                    column.value, event.event_name
                ),
            )),
        }
    }
}

fn unknown_entity(entity: &Spanned<String>, event_name: &str) -> ValidationError {
    ValidationError::new(
        entity.span,
        format!("Unknown entity `{}` on event `{}`", entity.value, event_name),
    )
}

fn output_alias(alias: &Spanned<String>) -> ValidationResult<()> {
    if alias.value.starts_with(RESERVED_ALIAS_PREFIX) {
        return Err(ValidationError::new(
            alias.span,
            format!(
                "alias `{}` uses the reserved prefix `{}`",
                alias.value, RESERVED_ALIAS_PREFIX
            ),
        ));
    }
    Ok(())
}

/// Whether `column` names the id column of one of the join's key entities.
///
/// Decided by name alone: a key id column that is also declared as an
/// attribute still counts.
pub fn is_key_column(column: &str, keys: &[&EntityRef]) -> bool {
    keys.iter().any(|k| k.entity_id_alias == column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{demo, Attribute, InMemoryCatalog};
    use crate::dsl::parse_with_spans;
    use crate::dsl::span::Position;
    use crate::types::DataType;

    fn check(text: &str) -> ValidationResult<()> {
        let query = parse_with_spans(text).expect("query should parse");
        validate_query(&query, &demo::build())
    }

    fn check_err(text: &str) -> ValidationError {
        check(text).expect_err("query should not validate")
    }

    #[test]
    fn test_valid_query() {
        check(
            "select first user_signed_up ( user_id as user_id, ts as signup_ts ) \
             join after user_logged_in ( using user_id count(event_id) as logins, \
             last_value(device) as device, filter(status = 'ok') )",
        )
        .unwrap();
    }

    #[test]
    fn test_unknown_event_in_select() {
        let err = check_err("select first made_up_event ( id as id )");
        assert_eq!(err.message, "Unknown event `made_up_event`");
        assert_eq!(err.span.start(), Position::new(0, 13));
    }

    #[test]
    fn test_unknown_event_in_join() {
        let err = check_err(
            "select first user_signed_up ( plan as plan ) join after nope ( count(x) as n )",
        );
        assert_eq!(err.message, "Unknown event `nope`");
    }

    #[test]
    fn test_base_selector_required() {
        let err = check_err("select user_signed_up ( user_id as user_id )");
        assert!(err.message.contains("must specify a selector"));
        assert_eq!(
            err.message,
            "event `user_signed_up` must specify a selector (first/last)"
        );
    }

    #[test]
    fn test_aggregation_in_select_rejected() {
        let err = check_err("select first user_signed_up ( count(plan) as n )");
        assert_eq!(
            err.message,
            "select on `user_signed_up` does not support aggregated column `n`"
        );
    }

    #[test]
    fn test_unknown_column() {
        let err = check_err("select last user_signed_up ( shoe_size as s )");
        assert_eq!(err.message, "Unknown column `shoe_size` on event `user_signed_up`");

        let err = check_err(
            "select last user_signed_up ( plan as plan ) \
             join before user_logged_in ( max(shoe_size) as s )",
        );
        assert_eq!(err.message, "Unknown column `shoe_size` on event `user_logged_in`");
    }

    #[test]
    fn test_unknown_using_entity() {
        let err = check_err(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( using account_id count(event_id) as n )",
        );
        assert_eq!(err.message, "Unknown entity `account_id` on event `user_logged_in`");
    }

    #[test]
    fn test_key_must_exist_on_base_event() {
        let err = check_err(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( using entity_1 count(event_id) as n )",
        );
        assert_eq!(err.message, "Unknown entity `entity_1` on event `user_signed_up`");
    }

    #[test]
    fn test_missing_default_entity_requires_using() {
        let catalog = InMemoryCatalog::new(vec![
            Event::new("a", "event_id", "ts", "a")
                .with_entity(EntityRef::new("user_id").default_entity()),
            Event::new("b", "event_id", "ts", "b")
                .with_entity(EntityRef::new("user_id"))
                .with_attribute(Attribute::new("v", DataType::Integer)),
        ])
        .unwrap();

        let query =
            parse_with_spans("select first a ( user_id as u ) join after b ( sum(v) as v )").unwrap();
        let err = validate_query(&query, &catalog).unwrap_err();
        assert!(err.message.contains("needs a using clause"));

        let query = parse_with_spans(
            "select first a ( user_id as u ) join after b ( using user_id sum(v) as v )",
        )
        .unwrap();
        validate_query(&query, &catalog).unwrap();
    }

    #[test]
    fn test_omitted_selector_requires_aggregation() {
        let err = check_err(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( device as device )",
        );
        assert!(err.message.contains("requires aggregated column"));
        assert_eq!(
            err.message,
            "join on `user_logged_in` requires aggregated column for `device` when no selector is specified"
        );
    }

    #[test]
    fn test_omitted_selector_allows_key_columns() {
        check(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( user_id as uid, count(event_id) as n )",
        )
        .unwrap();

        // entity_2 is not a join key.
        let err = check_err(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( entity_2 as e, count(event_id) as n )",
        );
        assert!(err.message.contains("requires aggregated column for `e`"));
    }

    #[test]
    fn test_selected_join_allows_references() {
        check(
            "select first user_signed_up ( plan as plan ) \
             join after last user_logged_in ( device as device, status as status )",
        )
        .unwrap();
    }

    #[test]
    fn test_unknown_filter_column() {
        let err = check_err(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( count(event_id) as n, filter(mood = 'happy') )",
        );
        assert_eq!(err.message, "Unknown column `mood` on event `user_logged_in`");
    }

    #[test]
    fn test_first_error_wins() {
        // Both the base column and the join event are wrong.
        let err = check_err(
            "select first user_signed_up ( nope as nope ) join after missing ( count(x) as n )",
        );
        assert!(err.message.starts_with("Unknown column `nope`"));
    }

    #[test]
    fn test_join_keys() {
        let catalog = demo::build();
        let event = catalog.get_event("user_logged_in").unwrap();
        let query = parse_with_spans(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( count(event_id) as n ) \
             join after user_logged_in ( using entity_1, user_id count(event_id) as m )",
        )
        .unwrap();

        let keys: Vec<_> = join_keys(&query.joins[0], event)
            .iter()
            .map(|e| e.entity_name.as_str())
            .collect();
        assert_eq!(keys, vec!["user_id"]);

        let keys: Vec<_> = join_keys(&query.joins[1], event)
            .iter()
            .map(|e| e.entity_name.as_str())
            .collect();
        assert_eq!(keys, vec!["entity_1", "user_id"]);
    }

    #[test]
    fn test_key_column_declared_as_attribute() {
        let catalog = InMemoryCatalog::new(vec![
            Event::new("user_signed_up", "event_id", "ts", "user_signed_up")
                .with_entity(EntityRef::new("user_id").default_entity())
                .with_attribute(Attribute::new("user_id", DataType::String)),
            Event::new("user_logged_in", "event_id", "ts", "user_logged_in")
                .with_entity(EntityRef::new("user_id").default_entity())
                .with_attribute(Attribute::new("event_id", DataType::String))
                .with_attribute(Attribute::new("ts", DataType::Timestamp))
                .with_attribute(Attribute::new("status", DataType::String))
                .with_attribute(Attribute::new("user_id", DataType::String)),
        ])
        .unwrap();
        let validate = |text: &str| validate_query(&parse_with_spans(text).unwrap(), &catalog);

        validate(
            "select first user_signed_up ( user_id as user_id ) \
             join after user_logged_in ( using user_id user_id as uid, count(event_id) as n )",
        )
        .unwrap();

        let err = validate(
            "select first user_signed_up ( user_id as user_id ) \
             join after user_logged_in ( status as status, count(event_id) as n )",
        )
        .unwrap_err();
        assert!(err.message.contains("requires aggregated column for `status`"));
    }

    #[test]
    fn test_is_key_column_matches_id_alias() {
        let renamed = EntityRef::new("user").with_id_alias("uid");
        let keys = vec![&renamed];
        assert!(is_key_column("uid", &keys));
        assert!(!is_key_column("user", &keys));
        assert!(!is_key_column("uid", &[]));
    }

    #[test]
    fn test_reserved_alias_prefix() {
        let err = check_err("select first user_signed_up ( plan as __eeql_rn )");
        assert_eq!(
            err.message,
            "alias `__eeql_rn` uses the reserved prefix `__eeql_`"
        );
        assert_eq!(err.span.start(), Position::new(0, 38));

        let err = check_err(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( count(event_id) as __eeql_base_key )",
        );
        assert!(err.message.starts_with("alias `__eeql_base_key`"));

        // Only the prefix is reserved.
        check("select first user_signed_up ( plan as eeql_rn, ts as _eeql_ts )").unwrap();
    }
}
