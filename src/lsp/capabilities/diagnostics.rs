//! Diagnostics for one document: the first syntax error, else the first
//! validation error, else nothing.

use tracing::debug;

use crate::catalog::Catalog;
use crate::dsl::parse_with_spans;
use crate::lsp::types::{Diagnostic, DiagnosticSource, Severity};
use crate::validation::validate_query;

/// Check `text` against `catalog`. Never fails; problems become diagnostics.
pub fn diagnostics<C: Catalog + ?Sized>(text: &str, catalog: &C) -> Vec<Diagnostic> {
    let (message, span, source) = match parse_with_spans(text) {
        Err(err) => (err.message, err.span, DiagnosticSource::Syntax),
        Ok(query) => match validate_query(&query, catalog) {
            Ok(()) => return Vec::new(),
            Err(err) => (err.message, err.span, DiagnosticSource::Validation),
        },
    };
    debug!(source = source.as_str(), %span, "diagnostic");
    vec![Diagnostic {
        message,
        span,
        severity: Severity::Error,
        source,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::demo;
    use crate::dsl::{Position, Span};

    #[test]
    fn test_valid_document_is_clean() {
        let catalog = demo::build();
        assert!(diagnostics(
            "select first user_signed_up ( plan as plan ) \
             join after user_logged_in ( count(event_id) as n )",
            &catalog
        )
        .is_empty());
    }

    #[test]
    fn test_syntax_error_is_reported_once() {
        let catalog = demo::build();
        let diags = diagnostics("select first ( plan as plan", &catalog);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].source, DiagnosticSource::Syntax);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_validation_error_span() {
        let catalog = demo::build();
        let diags = diagnostics("select first nothing_here ( a as a )", &catalog);
        assert_eq!(
            diags,
            vec![Diagnostic {
                message: "Unknown event `nothing_here`".into(),
                span: Span::new(Position::new(0, 13), Position::new(0, 25)),
                severity: Severity::Error,
                source: DiagnosticSource::Validation,
            }]
        );
    }
}
