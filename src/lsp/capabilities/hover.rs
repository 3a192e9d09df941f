//! Hover text for the node under the cursor.

use crate::catalog::{Catalog, Event};
use crate::dsl::ast::{JoinQualifier, Node, Query, SelectorKind};
use crate::dsl::{parse_with_spans, LineIndex, Position, Span};
use crate::lsp::analysis::context::word_at;
use crate::lsp::types::Hover;

/// Hover for `position`, or `None` when there is nothing to say.
///
/// A document that does not parse still answers for an identifier that
/// names a catalog event.
pub fn hover<C: Catalog + ?Sized>(text: &str, position: Position, catalog: &C) -> Option<Hover> {
    match parse_with_spans(text) {
        Ok(query) => hover_node(&query, position, catalog),
        Err(_) => hover_word(text, position, catalog),
    }
}

fn hover_node<C: Catalog + ?Sized>(
    query: &Query,
    position: Position,
    catalog: &C,
) -> Option<Hover> {
    let node = query.node_at(position)?;
    let span = node.span();
    let contents = match node {
        Node::EventName(_, name) => catalog.get_event(&name.value)?.summary(),
        Node::Selector(_, selector) => match selector.kind {
            SelectorKind::First => "first: the earliest row per entity by event timestamp".into(),
            SelectorKind::Last => "last: the latest row per entity by event timestamp".into(),
            SelectorKind::Omitted => return None,
        },
        Node::Qualifier(_, qualifier) => match qualifier.value {
            JoinQualifier::Before => "before: joined rows earlier than the selected row".into(),
            JoinQualifier::After => "after: joined rows later than the selected row".into(),
        },
        Node::Function(_, function) => {
            format!("{}: {}", function.value.as_str(), function.value.description())
        }
        Node::SourceColumn(clause, column) => {
            let event = catalog.get_event(query.event_name(clause)?)?;
            column_summary(event, &column.value)?
        }
        Node::FilterColumn(i, column) => {
            let event = catalog.get_event(query.event_name(Some(i))?)?;
            column_summary(event, &column.value)?
        }
        Node::UsingEntity(i, entity) => {
            let event = catalog.get_event(query.event_name(Some(i))?)?;
            let entity = event.entity(&entity.value)?;
            format!(
                "entity {} on event {}: matched on column {}",
                entity.entity_name, event.event_name, entity.entity_id_alias
            )
        }
        Node::Alias(_, alias) => format!("output column {}", alias.value),
        _ => return None,
    };
    Some(Hover { contents, span })
}

/// `column <c> on event <e>: <type> (<origin>)`
fn column_summary(event: &Event, column: &str) -> Option<String> {
    let resolved = event.resolve_column(column)?;
    let data_type = resolved
        .data_type
        .map_or_else(|| "identifier".to_string(), |t| t.to_string());
    Some(format!(
        "column {} on event {}: {} ({})",
        column, event.event_name, data_type, resolved.origin
    ))
}

fn hover_word<C: Catalog + ?Sized>(text: &str, position: Position, catalog: &C) -> Option<Hover> {
    let index = LineIndex::new(text);
    let (word, range) = word_at(text, index.offset(position))?;
    let event = catalog.get_event(word)?;
    let span: Span = index.span(range);
    Some(Hover {
        contents: event.summary(),
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::demo;

    const QUERY: &str = "select first user_signed_up ( plan as p )\n\
                         join after user_logged_in ( using user_id count(event_id) as n, filter(status = 'ok') )";

    fn hover_at(text: &str, line: u32, character: u32) -> Option<Hover> {
        hover(text, Position::new(line, character), &demo::build())
    }

    #[test]
    fn test_hover_event_name() {
        let hover = hover_at(QUERY, 0, 13).unwrap();
        assert!(hover.contents.starts_with("event user_signed_up: entities [user_id (default)]"));
        assert_eq!(
            hover.span,
            Span::new(Position::new(0, 13), Position::new(0, 27))
        );
    }

    #[test]
    fn test_hover_columns_and_entities() {
        let plan = hover_at(QUERY, 0, 31).unwrap();
        assert_eq!(
            plan.contents,
            "column plan on event user_signed_up: string (attribute)"
        );

        let user_id = hover_at(QUERY, 1, 35).unwrap();
        assert_eq!(
            user_id.contents,
            "entity user_id on event user_logged_in: matched on column user_id"
        );

        let event_id = hover_at(QUERY, 1, 50).unwrap();
        assert_eq!(
            event_id.contents,
            "column event_id on event user_logged_in: identifier (event id)"
        );

        let status = hover_at(QUERY, 1, 73).unwrap();
        assert!(status.contents.starts_with("column status on event user_logged_in"));
    }

    #[test]
    fn test_hover_keywords_and_functions() {
        assert!(hover_at(QUERY, 0, 8).unwrap().contents.starts_with("first:"));
        assert!(hover_at(QUERY, 1, 6).unwrap().contents.starts_with("after:"));
        assert!(hover_at(QUERY, 1, 44).unwrap().contents.starts_with("count:"));
    }

    #[test]
    fn test_hover_on_nothing() {
        // clause punctuation
        assert!(hover_at(QUERY, 0, 28).is_none());
        assert!(hover_at(QUERY, 5, 0).is_none());
    }

    #[test]
    fn test_hover_falls_back_on_broken_text() {
        let text = "select first user_logged_in (";
        let hover = hover_at(text, 0, 20).unwrap();
        assert!(hover.contents.starts_with("event user_logged_in"));
        assert_eq!(hover.span, Span::new(Position::new(0, 13), Position::new(0, 27)));

        assert!(hover_at("select first nope (", 0, 14).is_none());
    }
}
