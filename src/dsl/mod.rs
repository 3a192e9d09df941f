//! Parser for the EEQL query language.
//!
//! EEQL selects one row per entity from a base event and attaches values
//! from other events of the same entity, constrained to happen before or
//! after the selected row:
//!
//! ```text
//! select first user_signed_up ( user_id as user_id, ts as signup_ts )
//! join after user_logged_in (
//!     using user_id
//!     count(event_id) as login_count,
//!     last_value(ts) as last_login_ts,
//!     filter(status = 'ok')
//! )
//! ```
//!
//! # Example
//!
//! ```
//! use eeql::dsl;
//!
//! let query = dsl::parse_with_spans("select first signup ( user_id as uid )").unwrap();
//! assert_eq!(query.select.event_name.value, "signup");
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod span;

use chumsky::error::Rich;
use chumsky::input::Input;
use chumsky::span::SimpleSpan;
use chumsky::Parser as _;
use tracing::debug;

pub use ast::*;
pub use span::{LineIndex, Position, Span, Spanned};

/// Malformed query text. Only the first error is reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

/// Parse query text into a [`Query`] whose nodes all carry line/column spans.
///
/// # Errors
///
/// Returns the first lexer or parser error as a [`SyntaxError`].
pub fn parse_with_spans(source: &str) -> Result<Query, SyntaxError> {
    let index = LineIndex::new(source);

    // Step 1: Lexical analysis
    let tokens = lexer::lex(source).map_err(|errs| {
        let error = first_error(&index, errs.into_iter().map(|e: Rich<'_, char>| {
            (*e.span(), e.to_string())
        }));
        debug!(error = %error.message, span = %error.span, "lexing failed");
        error
    })?;

    // Step 2: Parsing
    let len = source.len();
    let eoi: SimpleSpan = (len..len).into();
    let token_stream = tokens.as_slice().map(
        eoi,
        |(tok, span): &(lexer::Token<'_>, SimpleSpan)| (tok, span),
    );

    let (query, parse_errs) = parser::parser(&index)
        .parse(token_stream)
        .into_output_errors();

    if !parse_errs.is_empty() {
        let error = first_error(
            &index,
            parse_errs
                .into_iter()
                .map(|e: Rich<'_, lexer::Token<'_>, SimpleSpan>| (*e.span(), e.to_string())),
        );
        debug!(error = %error.message, span = %error.span, "parsing failed");
        return Err(error);
    }

    query.ok_or_else(|| SyntaxError {
        message: "Expected a query".to_string(),
        span: index.span(0..len),
    })
}

fn first_error(
    index: &LineIndex<'_>,
    mut errors: impl Iterator<Item = (SimpleSpan, String)>,
) -> SyntaxError {
    match errors.next() {
        Some((span, message)) => SyntaxError {
            message,
            span: index.span(span.start..span.end),
        },
        None => SyntaxError {
            message: "Invalid query".to_string(),
            span: index.span(0..0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_spans_ok() {
        let query = parse_with_spans("SELECT LAST signup ( plan AS plan )").unwrap();
        assert_eq!(query.select.selector.kind, SelectorKind::Last);
        assert_eq!(query.select.event_name.span.start(), Position::new(0, 12));
    }

    #[test]
    fn test_missing_event_name_is_syntax_error() {
        let err = parse_with_spans("select first ( x as x )").unwrap_err();
        assert_eq!(err.span.start(), Position::new(0, 13));
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_unbalanced_paren_reports_end_of_input() {
        let text = "select first a (\n  x as x";
        let err = parse_with_spans(text).unwrap_err();
        assert_eq!(err.span.start(), Position::new(1, 8));
    }

    #[test]
    fn test_unknown_function_message() {
        let err = parse_with_spans("select first a ( median(x) as m )").unwrap_err();
        assert_eq!(err.to_string(), "Unknown aggregation function `median`");
        assert_eq!(err.span.start(), Position::new(0, 17));
        assert_eq!(err.span.end(), Position::new(0, 23));
    }

    #[test]
    fn test_lex_error_is_syntax_error() {
        let err = parse_with_spans("select first a ( x as x ) ;").unwrap_err();
        assert_eq!(err.span.start(), Position::new(0, 26));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_with_spans("").is_err());
        assert!(parse_with_spans("   -- only a comment\n").is_err());
    }
}
