//! Integration tests for lowering queries to datasets and rendering SQL.

use eeql::catalog::{demo, Attribute, EntityRef, Event, InMemoryCatalog};
use eeql::compile::{compile, compile_dataset, CompileError, CompileOptions};
use eeql::compiler::{compile_to_dataset, ColumnValue, LoweringError};
use eeql::dsl::{parse_with_spans, AggregateFunction, JoinQualifier, SelectorKind};
use eeql::types::DataType;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

fn validate_sql(sql: &str) {
    if let Err(e) = Parser::parse_sql(&GenericDialect {}, sql) {
        panic!("Invalid SQL: {}\nSQL: {}", e, sql);
    }
}

/// Each key column is declared both as an entity and as an attribute.
fn scenario_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        Event::new("user_signed_up", "event_id", "ts", "user_signed_up")
            .with_entity(EntityRef::new("user_id").default_entity())
            .with_attribute(Attribute::new("user_id", DataType::String))
            .with_attribute(Attribute::new("ts", DataType::Timestamp)),
        Event::new("user_logged_in", "event_id", "ts", "user_logged_in")
            .with_entity(EntityRef::new("user_id").default_entity())
            .with_attribute(Attribute::new("event_id", DataType::String))
            .with_attribute(Attribute::new("ts", DataType::Timestamp))
            .with_attribute(Attribute::new("status", DataType::String))
            .with_attribute(Attribute::new("user_id", DataType::String)),
    ])
    .unwrap()
}

const SCENARIO_A: &str = "select first user_signed_up ( user_id as user_id, ts as signup_ts ) \
join after user_logged_in ( using user_id count(event_id) as login_count, \
last_value(ts) as last_login_ts, filter(status = 'ok') )";

// ============================================================================
// Scenario A
// ============================================================================

#[test]
fn test_scenario_a_compiles() {
    let catalog = scenario_catalog();
    let dataset = compile_dataset(SCENARIO_A, &catalog).unwrap();

    assert_eq!(dataset.base_event.event.event_name, "user_signed_up");
    assert_eq!(dataset.base_event.selector, SelectorKind::First);
    assert_eq!(dataset.joined_events.len(), 1);

    let join = &dataset.joined_events[0];
    assert_eq!(join.qualifier, JoinQualifier::After);
    assert_eq!(join.using_entities, vec!["user_id".to_string()]);
    assert_eq!(join.columns.len(), 2);
    assert!(matches!(
        join.columns[0].value,
        ColumnValue::Aggregation {
            function: AggregateFunction::Count,
            ..
        }
    ));

    let sql = dataset.to_sql();
    assert!(sql.contains("user_signed_up"));
    assert!(sql.contains("user_logged_in"));
    assert!(sql.contains("'ok'"));
    validate_sql(&sql);
    validate_sql(&dataset.to_sql_compact());
}

#[test]
fn test_scenario_a_output_columns_in_order() {
    let options = CompileOptions::default().with_pretty(false);
    let sql = compile(SCENARIO_A, &scenario_catalog(), options).unwrap().sql;

    let final_select = &sql[sql.rfind(") SELECT ").unwrap()..];
    let positions: Vec<usize> = [
        "AS \"user_id\"",
        "AS \"signup_ts\"",
        "AS \"login_count\"",
        "AS \"last_login_ts\"",
    ]
    .iter()
    .map(|needle| {
        final_select
            .find(needle)
            .unwrap_or_else(|| panic!("missing {} in\n{}", needle, final_select))
    })
    .collect();

    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
    assert!(final_select.contains("COALESCE(\"join_1\".\"login_count\", 0)"));
}

#[test]
fn test_using_key_reference_under_omitted_selector() {
    let text = "select first user_signed_up ( user_id as user_id ) \
                join after user_logged_in ( using user_id user_id as uid, count(event_id) as n )";
    let dataset = compile_dataset(text, &scenario_catalog()).unwrap();

    let join = &dataset.joined_events[0];
    assert_eq!(join.selector, SelectorKind::Omitted);
    assert_eq!(
        join.columns[0].value,
        ColumnValue::Reference {
            source_column: "user_id".to_string(),
            physical: "user_id".to_string(),
        }
    );

    let sql = dataset.to_sql_compact();
    assert!(
        sql.contains("GROUP BY \"join_1_rows\".\"__eeql_base_key\", \"join_1_rows\".\"uid\""),
        "{}",
        sql
    );
    validate_sql(&sql);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_compilation_is_deterministic() {
    let catalog = demo::build();
    let text = "select first user_signed_up ( plan as plan ) \
                join after last user_logged_in ( device as device ) \
                join after order_placed ( sum(amount) as revenue )";
    let query = parse_with_spans(text).unwrap();

    let first = compile_to_dataset(&query, &catalog).unwrap().to_sql();
    let second = compile_to_dataset(&query, &catalog).unwrap().to_sql();
    assert_eq!(first, second);
}

#[test]
fn test_joined_events_follow_declaration_order() {
    let catalog = demo::build();
    let text = "select first user_signed_up ( plan as plan ) \
                join after order_placed ( count(event_id) as orders ) \
                join before last user_logged_in ( status as status ) \
                join after first order_placed ( amount as first_amount ) \
                join after user_logged_in ( max(ts) as last_seen )";
    let query = parse_with_spans(text).unwrap();
    let dataset = compile_to_dataset(&query, &catalog).unwrap();

    let events: Vec<_> = dataset
        .joined_events
        .iter()
        .map(|j| j.event.event_name.as_str())
        .collect();
    assert_eq!(
        events,
        vec!["order_placed", "user_logged_in", "order_placed", "user_logged_in"]
    );

    let sql = dataset.to_sql();
    for cte in ["\"join_1\"", "\"join_2\"", "\"join_3\"", "\"join_4\""] {
        assert!(sql.contains(cte), "missing {} in\n{}", cte, sql);
    }
    validate_sql(&sql);
}

#[test]
fn test_temporal_conditions() {
    let catalog = demo::build();

    let after = compile(
        "select first user_signed_up ( plan as plan ) join after user_logged_in ( count(event_id) as n )",
        &catalog,
        CompileOptions::default(),
    )
    .unwrap();
    assert!(after.sql.contains("\"j\".\"ts\" > \"base\".\"ts\""));

    let before = compile(
        "select first user_signed_up ( plan as plan ) join before user_logged_in ( count(event_id) as n )",
        &catalog,
        CompileOptions::default(),
    )
    .unwrap();
    assert!(before.sql.contains("\"j\".\"ts\" < \"base\".\"ts\""));
}

#[test]
fn test_compact_output_is_single_line() {
    let output = compile(
        "select last user_logged_in ( device as device ) join after order_placed ( avg(amount) as avg_amount )",
        &demo::build(),
        CompileOptions::default().with_pretty(false),
    )
    .unwrap();
    assert!(!output.sql.contains('\n'));
    validate_sql(&output.sql);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_compile_reports_each_stage() {
    let catalog = demo::build();

    let err = compile("select first ( a as a )", &catalog, CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));

    let err = compile("select first nope ( a as a )", &catalog, CompileOptions::default())
        .unwrap_err();
    assert!(matches!(err, CompileError::Validation(_)));
    assert!(err.span().is_some());
}

#[test]
fn test_unvalidated_query_fails_loudly() {
    let catalog = demo::build();
    let query = parse_with_spans("select user_signed_up ( plan as plan )").unwrap();
    assert_eq!(
        compile_to_dataset(&query, &catalog).unwrap_err(),
        LoweringError::MissingSelector("user_signed_up".to_string())
    );

    let query = parse_with_spans("select first nope ( plan as plan )").unwrap();
    assert_eq!(
        compile_to_dataset(&query, &catalog).unwrap_err(),
        LoweringError::UnknownEvent("nope".to_string())
    );
}
