//! Completion items for the cursor position.
//!
//! Candidates depend on the detected context and are filtered by the typed
//! fragment as a case-sensitive prefix. Event positions also offer
//! `first` and `last` until a selector has been written. Order follows catalog and keyword
//! declaration order; the first occurrence of a label wins.

use crate::catalog::Catalog;
use crate::dsl::ast::AggregateFunction;
use crate::dsl::lexer::KEYWORDS;
use crate::dsl::{LineIndex, Position};
use crate::lsp::analysis::context::{detect_context, fragment_at, CompletionContext};
use crate::lsp::types::{CompletionItem, CompletionKind};

/// Completion items for `position` in `text`.
pub fn completions<C: Catalog + ?Sized>(
    text: &str,
    position: Position,
    catalog: &C,
) -> Vec<CompletionItem> {
    let offset = LineIndex::new(text).offset(position);
    let prefix = fragment_at(text, offset).text;

    let candidates = match detect_context(text, offset) {
        CompletionContext::Start => {
            let mut items = events(catalog);
            items.extend(keywords());
            items.extend(functions());
            items
        }
        CompletionContext::EventName { selector_typed } => {
            let mut items = events(catalog);
            if !selector_typed {
                items.extend(selectors());
            }
            items
        }
        CompletionContext::Clause { event, in_using } => {
            let mut items = match event.as_deref().and_then(|e| catalog.get_event(e)) {
                Some(event) if in_using => event
                    .entities
                    .iter()
                    .map(|e| {
                        CompletionItem::new(&e.entity_name, CompletionKind::Entity)
                            .with_detail(format!("entity on {}", event.event_name))
                    })
                    .collect(),
                Some(event) => event
                    .column_names()
                    .into_iter()
                    .map(|name| {
                        let detail = event
                            .resolve_column(&name)
                            .map(|c| c.origin.to_string())
                            .unwrap_or_default();
                        CompletionItem::new(name, CompletionKind::Column).with_detail(detail)
                    })
                    .collect(),
                None => Vec::new(),
            };
            items.extend(functions());
            items.extend(keywords());
            items
        }
        CompletionContext::Other => {
            let mut items = keywords();
            items.extend(functions());
            items
        }
    };

    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|item| item.label.starts_with(prefix))
        .filter(|item| seen.insert(item.label.clone()))
        .collect()
}

fn events<C: Catalog + ?Sized>(catalog: &C) -> Vec<CompletionItem> {
    catalog
        .list_event_names()
        .into_iter()
        .map(|name| {
            let item = CompletionItem::new(name.as_str(), CompletionKind::Event);
            match catalog.get_event(&name) {
                Some(event) => item.with_detail(format!("event on {}", event.source_table)),
                None => item,
            }
        })
        .collect()
}

fn keywords() -> Vec<CompletionItem> {
    KEYWORDS
        .iter()
        .map(|k| CompletionItem::new(*k, CompletionKind::Keyword))
        .collect()
}

fn selectors() -> Vec<CompletionItem> {
    ["first", "last"]
        .into_iter()
        .map(|k| CompletionItem::new(k, CompletionKind::Keyword))
        .collect()
}

fn functions() -> Vec<CompletionItem> {
    AggregateFunction::ALL
        .iter()
        .map(|f| CompletionItem::new(f.as_str(), CompletionKind::Function).with_detail(f.description()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::demo;

    fn labels(text: &str) -> Vec<String> {
        let index = LineIndex::new(text);
        let end = index.position(text.len());
        completions(text, end, &demo::build())
            .into_iter()
            .map(|i| i.label)
            .collect()
    }

    #[test]
    fn test_prefix_at_start_offers_events_first() {
        assert_eq!(labels("user"), vec!["user_signed_up", "user_logged_in"]);
        assert_eq!(labels("se"), vec!["select"]);
    }

    #[test]
    fn test_event_position_offers_only_events() {
        assert_eq!(
            labels("select first "),
            vec!["user_signed_up", "user_logged_in", "order_placed"]
        );
        assert_eq!(labels("select first o"), vec!["order_placed"]);
        assert!(labels("select first x").is_empty());
    }

    #[test]
    fn test_selector_offered_until_typed() {
        assert_eq!(
            labels("select "),
            vec!["user_signed_up", "user_logged_in", "order_placed", "first", "last"]
        );
        assert_eq!(labels("select fi"), vec!["first"]);
        assert_eq!(labels("select l"), vec!["last"]);
        assert_eq!(
            labels("select first user_signed_up ( plan as plan ) join after "),
            vec!["user_signed_up", "user_logged_in", "order_placed", "first", "last"]
        );
        assert_eq!(labels("select first user_signed_up ( plan as plan ) join before la"), vec!["last"]);
        // Events still come first when both match.
        assert_eq!(labels("select u"), vec!["user_signed_up", "user_logged_in"]);
    }

    #[test]
    fn test_clause_offers_columns_then_functions() {
        assert_eq!(labels("select first order_placed ( c"), vec!["currency", "count", "count_distinct"]);
        assert_eq!(
            labels("select first user_signed_up ( plan as plan ) join after user_logged_in ( using entity_"),
            vec!["entity_1", "entity_2"]
        );
    }

    #[test]
    fn test_elsewhere_offers_keywords() {
        assert_eq!(labels("select first user_signed_up ( plan as plan ) j"), vec!["join"]);
        assert_eq!(
            labels("select first user_signed_up ( plan as plan ) join "),
            vec![
                "select", "join", "before", "after", "first", "last", "using", "filter", "as",
                "count", "count_distinct", "sum", "avg", "min", "max", "first_value", "last_value",
            ]
        );
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(labels("User").is_empty());
    }

    #[test]
    fn test_items_carry_kind_and_detail() {
        let text = "select last ";
        let end = LineIndex::new(text).position(text.len());
        let items = completions(text, end, &demo::build());
        assert_eq!(items[0].kind, CompletionKind::Event);
        assert_eq!(items[0].detail.as_deref(), Some("event on user_signed_up"));
    }
}
