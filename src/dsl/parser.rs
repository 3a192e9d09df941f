//! Parser for EEQL using chumsky.
//!
//! Transforms the lexer's token stream into a [`Query`]. Byte spans from the
//! lexer are converted to line/column spans through a [`LineIndex`] as each
//! node is built, so every node carries its final span.

use chumsky::input::ValueInput;
use chumsky::prelude::*;

use super::ast::*;
use super::lexer::Token;
use super::span::{LineIndex, Span, Spanned};

/// Parse a number token. Anything that overflows `i64` falls back to float.
fn number_literal(s: &str) -> Literal {
    if !s.contains('.') {
        if let Ok(n) = s.parse::<i64>() {
            return Literal::Integer(n);
        }
    }
    Literal::Float(s.parse::<f64>().unwrap_or(f64::NAN))
}

/// Create the query parser.
///
/// `index` must be built from the same text the tokens were lexed from.
pub fn parser<'tokens, 'src: 'tokens, I>(
    index: &'tokens LineIndex<'src>,
) -> impl Parser<'tokens, I, Query, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    let to_span = move |span: SimpleSpan| -> Span { index.span(span.start..span.end) };

    // ==========================================================================
    // Basic token parsers
    // ==========================================================================

    let ident = select! {
        Token::Ident(s) => s.to_string(),
    }
    .labelled("identifier");

    let spanned_ident = ident
        .clone()
        .map_with(move |s, e| Spanned::new(s, to_span(e.span())));

    let selector = select! {
        Token::First => SelectorKind::First,
        Token::Last => SelectorKind::Last,
    }
    .labelled("selector (first, last)")
    .map_with(move |kind, e| Selector {
        kind,
        span: to_span(e.span()),
    });

    // `first|last`? event_name; an omitted selector sits at the event name.
    let selected_event = selector.or_not().then(spanned_ident.clone().labelled("event name")).map(
        |(selector, event_name): (Option<Selector>, Spanned<String>)| {
            let selector = selector.unwrap_or(Selector {
                kind: SelectorKind::Omitted,
                span: Span::point(event_name.span.start()),
            });
            (selector, event_name)
        },
    );

    let qualifier = select! {
        Token::Before => JoinQualifier::Before,
        Token::After => JoinQualifier::After,
    }
    .labelled("join qualifier (before, after)")
    .map_with(move |q, e| Spanned::new(q, to_span(e.span())));

    let literal = select! {
        Token::StringLit(s) => Literal::String(s.to_string()),
        Token::Number(s) => number_literal(s),
    }
    .labelled("literal")
    .map_with(move |lit, e| Spanned::new(lit, to_span(e.span())));

    let operator = select! {
        Token::Eq => CompareOp::Eq,
        Token::NotEq => CompareOp::NotEq,
        Token::Lt => CompareOp::Lt,
        Token::Lte => CompareOp::Lte,
        Token::Gt => CompareOp::Gt,
        Token::Gte => CompareOp::Gte,
    }
    .labelled("comparison operator")
    .map_with(move |op, e| Spanned::new(op, to_span(e.span())));

    // ==========================================================================
    // Columns: `f(arg) as alias` | `source as alias`
    // ==========================================================================

    let alias = just(Token::As).ignore_then(spanned_ident.clone().labelled("alias"));

    // The function name is checked only once the whole aggregation shape has
    // matched, so a plain reference never reports an unknown function.
    let aggregation = ident
        .clone()
        .map_with(|name, e| (name, e.span()))
        .then(
            spanned_ident
                .clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then(alias.clone())
        .validate(move |(((name, name_span), argument_column), alias), e, emitter| {
            let function = match AggregateFunction::from_str(&name) {
                Some(f) => f,
                None => {
                    emitter.emit(Rich::custom(
                        name_span,
                        format!("Unknown aggregation function `{}`", name),
                    ));
                    AggregateFunction::Count
                }
            };
            ColumnExpr::Aggregation {
                function: Spanned::new(function, to_span(name_span)),
                argument_column,
                alias,
                span: to_span(e.span()),
            }
        });

    let reference = spanned_ident
        .clone()
        .then(alias)
        .map_with(move |(source_column, alias), e| ColumnExpr::Reference {
            source_column,
            alias,
            span: to_span(e.span()),
        });

    let column = choice((aggregation, reference)).labelled("column");

    let columns = column
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .at_least(1)
        .collect::<Vec<_>>();

    // ==========================================================================
    // Join clause pieces
    // ==========================================================================

    // An identifier followed by `(` or `as` starts the column list instead.
    let using_entity = spanned_ident
        .clone()
        .then_ignore(choice((just(Token::LParen), just(Token::As))).not())
        .then_ignore(just(Token::Comma).or_not());

    let using_clause = just(Token::Using).ignore_then(
        using_entity
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .labelled("entity names"),
    );

    let filter = just(Token::Filter)
        .ignore_then(
            spanned_ident
                .clone()
                .then(operator)
                .then(literal)
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .map_with(move |((column, operator), literal), e| FilterExpr {
            column,
            operator,
            literal,
            span: to_span(e.span()),
        });

    // ==========================================================================
    // Clauses
    // ==========================================================================

    let select_clause = just(Token::Select)
        .ignore_then(selected_event.clone())
        .then(
            columns
                .clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .map_with(move |((selector, event_name), columns), e| SelectClause {
            event_name,
            selector,
            columns,
            span: to_span(e.span()),
        });

    let join_body = using_clause
        .or_not()
        .then(columns)
        .then(filter.or_not())
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let join_clause = just(Token::Join)
        .ignore_then(qualifier)
        .then(selected_event)
        .then(join_body)
        .map_with(
            move |((qualifier, (selector, event_name)), ((using, columns), filter)), e| {
                JoinClause {
                    qualifier,
                    event_name,
                    selector,
                    using_entities: using.unwrap_or_default(),
                    columns,
                    filter,
                    span: to_span(e.span()),
                }
            },
        );

    select_clause
        .then(join_clause.repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map_with(move |(select, joins), e| Query {
            select,
            joins,
            span: to_span(e.span()),
        })
}
