//! Render a [`Dataset`] through the SQL builder.
//!
//! The output is a chain of CTEs:
//!
//! ```text
//! base_ranked   every base row + ROW_NUMBER per partition key
//! base          rank 1 only
//! join_i_rows   (no selector) joined rows matching keys + time + filter
//! join_i_ranked (first/last)  same, ranked by joined timestamp
//! join_i        one row per base key
//! ```
//!
//! followed by a final SELECT that left-joins every `join_i` onto `base`.

use crate::dsl::ast::{AggregateFunction, CompareOp, JoinQualifier, Literal, SelectorKind};
use crate::sql::expr::WindowFrame;
use crate::sql::{
    avg, coalesce, count, count_distinct, first_value, last_value, lit_float, lit_int, lit_str,
    max, min, row_number, sum, table_col, table_star, Cte, Expr, ExprExt, Query, SelectExpr,
    TableRef, WindowExt, WindowOrderBy,
};

use super::dataset::{BaseEvent, ColumnValue, Dataset, Filter, JoinedEvent};

const BASE_RANKED: &str = "base_ranked";
const BASE: &str = "base";
const SOURCE: &str = "e";
const JOINED: &str = "j";
// Both start with RESERVED_ALIAS_PREFIX.
const RANK: &str = "__eeql_rn";
const BASE_KEY: &str = "__eeql_base_key";

pub(super) fn to_query(dataset: &Dataset) -> Query {
    let base = &dataset.base_event;
    let mut query = Query::new()
        .with_cte(Cte::new(BASE_RANKED, base_ranked(base)))
        .with_cte(Cte::new(BASE, rank_one(BASE_RANKED)));

    let mut select: Vec<SelectExpr> = base
        .columns
        .iter()
        .map(|c| table_col(BASE, &c.physical).alias(&c.alias))
        .collect();

    let mut joined = Vec::with_capacity(dataset.joined_events.len());
    for (i, join) in dataset.joined_events.iter().enumerate() {
        let name = format!("join_{}", i + 1);
        if join.selector == SelectorKind::Omitted {
            let rows = format!("{name}_rows");
            query = query
                .with_cte(Cte::new(&rows, joined_rows(base, join)))
                .with_cte(Cte::new(&name, grouped(&rows, join)));
        } else {
            let ranked = format!("{name}_ranked");
            query = query
                .with_cte(Cte::new(&ranked, joined_ranked(base, join)))
                .with_cte(Cte::new(&name, rank_one(&ranked)));
        }

        select.extend(join.columns.iter().map(|c| {
            let value = table_col(&name, &c.alias);
            let value = match &c.value {
                ColumnValue::Aggregation { function, .. } if function.is_count() => {
                    coalesce(vec![value, lit_int(0)])
                }
                _ => value,
            };
            value.alias(&c.alias)
        }));
        joined.push(name);
    }

    let mut query = query.select(select).from(TableRef::new(BASE));
    for name in &joined {
        query = query.left_join(
            TableRef::new(name),
            table_col(name, BASE_KEY).eq(table_col(BASE, &base.partition_key)),
        );
    }
    query
}

fn order_by_ts(table: &str, ts: &str, selector: SelectorKind) -> WindowOrderBy {
    match selector {
        SelectorKind::Last => WindowOrderBy::desc(table_col(table, ts)),
        SelectorKind::First | SelectorKind::Omitted => WindowOrderBy::asc(table_col(table, ts)),
    }
}

fn base_ranked(base: &BaseEvent) -> Query {
    let ts = &base.event.event_timestamp_alias;
    let rank = row_number()
        .over()
        .partition_by(vec![table_col(SOURCE, &base.partition_key)])
        .order_by(vec![order_by_ts(SOURCE, ts, base.selector)])
        .build();

    Query::new()
        .select(vec![SelectExpr::new(table_star(SOURCE)), rank.alias(RANK)])
        .from(TableRef::new(&base.event.source_table).with_alias(SOURCE))
}

fn rank_one(cte: &str) -> Query {
    Query::new()
        .select(vec![table_star(cte)])
        .from(TableRef::new(cte))
        .filter(table_col(cte, RANK).eq(lit_int(1)))
}

/// `base INNER JOIN <joined table> ON keys AND time [WHERE filter]`.
fn matching_rows(base: &BaseEvent, join: &JoinedEvent, select: Vec<SelectExpr>) -> Query {
    let base_ts = table_col(BASE, &base.event.event_timestamp_alias);
    let joined_ts = table_col(JOINED, &join.event.event_timestamp_alias);
    let temporal = match join.qualifier {
        JoinQualifier::After => joined_ts.gt(base_ts),
        JoinQualifier::Before => joined_ts.lt(base_ts),
    };
    let on = join
        .keys
        .iter()
        .rev()
        .fold(temporal, |acc, key| {
            table_col(JOINED, &key.joined_column)
                .eq(table_col(BASE, &key.base_column))
                .and(acc)
        });

    let query = Query::new()
        .select(select)
        .from(TableRef::new(BASE))
        .inner_join(
            TableRef::new(&join.event.source_table).with_alias(JOINED),
            on,
        );
    match &join.filter {
        Some(filter) => query.filter(filter_expr(filter)),
        None => query,
    }
}

fn base_key(base: &BaseEvent) -> SelectExpr {
    table_col(BASE, &base.partition_key).alias(BASE_KEY)
}

fn positional_window(join: &JoinedEvent, base: &BaseEvent, function: Expr) -> Expr {
    function
        .over()
        .partition_by(vec![table_col(BASE, &base.partition_key)])
        .order_by(vec![WindowOrderBy::asc(table_col(
            JOINED,
            &join.event.event_timestamp_alias,
        ))])
        .frame(WindowFrame::rows_entire_partition())
        .build()
}

fn joined_rows(base: &BaseEvent, join: &JoinedEvent) -> Query {
    let mut select = vec![base_key(base)];
    for column in &join.columns {
        let value = match &column.value {
            ColumnValue::Reference { physical, .. } => table_col(JOINED, physical),
            ColumnValue::Aggregation {
                function, physical, ..
            } => {
                let arg = table_col(JOINED, physical);
                match function {
                    AggregateFunction::FirstValue => {
                        positional_window(join, base, first_value(arg))
                    }
                    AggregateFunction::LastValue => positional_window(join, base, last_value(arg)),
                    _ => arg,
                }
            }
        };
        select.push(value.alias(&column.alias));
    }
    matching_rows(base, join, select)
}

fn grouped(rows: &str, join: &JoinedEvent) -> Query {
    let mut select = vec![SelectExpr::new(table_col(rows, BASE_KEY))];
    let mut group_by = vec![table_col(rows, BASE_KEY)];
    for column in &join.columns {
        let value = table_col(rows, &column.alias);
        let value = match &column.value {
            ColumnValue::Reference { .. } => {
                group_by.push(value.clone());
                value
            }
            ColumnValue::Aggregation { function, .. } => aggregate(*function, value),
        };
        select.push(value.alias(&column.alias));
    }
    Query::new()
        .select(select)
        .from(TableRef::new(rows))
        .group_by(group_by)
}

fn aggregate(function: AggregateFunction, value: Expr) -> Expr {
    match function {
        AggregateFunction::Count => count(value),
        AggregateFunction::CountDistinct => count_distinct(value),
        AggregateFunction::Sum => sum(value),
        AggregateFunction::Avg => avg(value),
        AggregateFunction::Min => min(value),
        // positional windows are constant per group
        AggregateFunction::Max | AggregateFunction::FirstValue | AggregateFunction::LastValue => {
            max(value)
        }
    }
}

fn joined_ranked(base: &BaseEvent, join: &JoinedEvent) -> Query {
    let partition = || vec![table_col(BASE, &base.partition_key)];
    let mut select = vec![base_key(base)];
    for column in &join.columns {
        let value = match &column.value {
            ColumnValue::Reference { physical, .. } => table_col(JOINED, physical),
            ColumnValue::Aggregation {
                function, physical, ..
            } => {
                let arg = table_col(JOINED, physical);
                if function.is_positional() {
                    let f = match function {
                        AggregateFunction::FirstValue => first_value(arg),
                        _ => last_value(arg),
                    };
                    positional_window(join, base, f)
                } else {
                    aggregate(*function, arg).over().partition_by(partition()).build()
                }
            }
        };
        select.push(value.alias(&column.alias));
    }
    let rank = row_number()
        .over()
        .partition_by(partition())
        .order_by(vec![order_by_ts(
            JOINED,
            &join.event.event_timestamp_alias,
            join.selector,
        )])
        .build();
    select.push(rank.alias(RANK));
    matching_rows(base, join, select)
}

fn filter_expr(filter: &Filter) -> Expr {
    let column = table_col(JOINED, &filter.physical);
    let literal = match &filter.literal {
        Literal::String(s) => lit_str(s),
        Literal::Integer(n) => lit_int(*n),
        Literal::Float(x) => lit_float(*x),
    };
    match filter.operator {
        CompareOp::Eq => column.eq(literal),
        CompareOp::NotEq => column.ne(literal),
        CompareOp::Lt => column.lt(literal),
        CompareOp::Lte => column.lte(literal),
        CompareOp::Gt => column.gt(literal),
        CompareOp::Gte => column.gte(literal),
    }
}
