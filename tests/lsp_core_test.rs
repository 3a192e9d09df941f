//! Integration tests for the language-server core: diagnostics,
//! completions and hover.

use std::sync::Arc;
use std::thread;

use eeql::catalog::{demo, Catalog, InMemoryCatalog};
use eeql::dsl::{LineIndex, Position, Span};
use eeql::lsp::{completions, diagnostics, hover, CompletionKind, DiagnosticSource};

const VALID: &str = "select first user_signed_up ( plan as plan )\n\
join after user_logged_in ( using user_id count(event_id) as logins, filter(status = 'ok') )";

fn end_of(text: &str) -> Position {
    LineIndex::new(text).position(text.len())
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_d_hover_on_event_name() {
    let catalog = demo::build();
    let start = Position::new(0, 13);
    let end = Position::new(0, 27);

    for position in [start, Position::new(0, 20)] {
        let hover = hover(VALID, position, &catalog).unwrap();
        assert!(hover.contents.contains("event user_signed_up"));
        assert_eq!(hover.span, Span::new(start, end));
    }
}

#[test]
fn test_scenario_e_completes_partial_event() {
    let catalog = demo::build();

    for text in ["user", "select first user"] {
        let items = completions(text, end_of(text), &catalog);
        let item = items
            .iter()
            .find(|i| i.label == "user_signed_up")
            .unwrap_or_else(|| panic!("no user_signed_up for `{}`", text));
        assert_eq!(item.kind, CompletionKind::Event);
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_diagnostics_clean_and_idempotent() {
    let catalog = demo::build();
    assert!(diagnostics(VALID, &catalog).is_empty());

    let broken = "select first user_signed_up ( plan as plan )\njoin after nope ( count(x) as n )";
    let first = diagnostics(broken, &catalog);
    let second = diagnostics(broken, &catalog);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].source, DiagnosticSource::Validation);
    assert_eq!(first[0].message, "Unknown event `nope`");
    assert_eq!(first[0].span.start(), Position::new(1, 11));
}

#[test]
fn test_diagnostics_report_syntax_first() {
    let catalog = demo::build();
    let diags = diagnostics("select first nope ( a as a", &catalog);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].source, DiagnosticSource::Syntax);
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_completion_keywords_elsewhere() {
    let catalog = demo::build();
    let text = "select first user_signed_up ( plan as plan ) jo";
    let labels: Vec<_> = completions(text, end_of(text), &catalog)
        .into_iter()
        .map(|i| i.label)
        .collect();
    assert_eq!(labels, vec!["join"]);
}

#[test]
fn test_completion_inside_clause_lists_columns() {
    let catalog = demo::build();
    let text = "select first user_signed_up ( plan as plan )\njoin after order_placed ( a";
    let items = completions(text, end_of(text), &catalog);
    let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["amount", "avg", "after", "as"]);
    assert_eq!(items[0].kind, CompletionKind::Column);
}

#[test]
fn test_completion_offers_selector_before_event() {
    let catalog = demo::build();
    let text = "select fi";
    let items = completions(text, end_of(text), &catalog);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "first");
    assert_eq!(items[0].kind, CompletionKind::Keyword);
}

#[test]
fn test_completion_on_empty_catalog() {
    let catalog = InMemoryCatalog::new(Vec::new()).unwrap();
    assert!(completions("select first ", Position::new(0, 13), &catalog).is_empty());
}

// ============================================================================
// Hover edge cases
// ============================================================================

#[test]
fn test_hover_never_fails_on_garbage() {
    let catalog = demo::build();
    for text in ["", "(((", "select", "select first user_signed_up ( plan as"] {
        for line in 0..2 {
            for character in 0..40 {
                let _ = hover(text, Position::new(line, character), &catalog);
            }
        }
    }
}

#[test]
fn test_hover_unknown_event_is_none() {
    let catalog = demo::build();
    assert!(hover("select first nope ( a as a )", Position::new(0, 14), &catalog).is_none());
}

// ============================================================================
// Shared catalog
// ============================================================================

#[test]
fn test_concurrent_requests_share_catalog() {
    let catalog: Arc<dyn Catalog> = Arc::new(demo::build());

    let expected_diags = diagnostics(VALID, catalog.as_ref());
    let expected_hover = hover(VALID, Position::new(0, 13), catalog.as_ref());

    thread::scope(|scope| {
        for _ in 0..4 {
            let catalog = Arc::clone(&catalog);
            let expected_diags = &expected_diags;
            let expected_hover = &expected_hover;
            scope.spawn(move || {
                for _ in 0..25 {
                    assert_eq!(&diagnostics(VALID, catalog.as_ref()), expected_diags);
                    assert_eq!(
                        &hover(VALID, Position::new(0, 13), catalog.as_ref()),
                        expected_hover
                    );
                }
            });
        }
    });
}
