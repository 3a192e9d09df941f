//! Lexer for EEQL.
//!
//! Converts source text into a sequence of tokens with byte spans.
//! Keywords are case-insensitive; aggregation function names are plain
//! identifiers and are recognised by the parser.

use chumsky::prelude::*;

/// A token in an EEQL query.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // ========================================================================
    // Keywords
    // ========================================================================
    Select,
    Join,
    Before,
    After,
    First,
    Last,
    Using,
    Filter,
    As,

    // ========================================================================
    // Literals
    // ========================================================================
    /// An identifier (not a keyword).
    Ident(&'src str),
    /// A string literal (contents without quotes).
    StringLit(&'src str),
    /// A number, possibly negative or fractional.
    Number(&'src str),

    // ========================================================================
    // Symbols
    // ========================================================================
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `=`
    Eq,
    /// `!=` or `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl<'src> Token<'src> {
    /// Whether this token is one of the reserved keywords.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Select
                | Token::Join
                | Token::Before
                | Token::After
                | Token::First
                | Token::Last
                | Token::Using
                | Token::Filter
                | Token::As
        )
    }
}

impl<'src> std::fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Select => write!(f, "select"),
            Token::Join => write!(f, "join"),
            Token::Before => write!(f, "before"),
            Token::After => write!(f, "after"),
            Token::First => write!(f, "first"),
            Token::Last => write!(f, "last"),
            Token::Using => write!(f, "using"),
            Token::Filter => write!(f, "filter"),
            Token::As => write!(f, "as"),

            Token::Ident(s) => write!(f, "{}", s),
            Token::StringLit(s) => write!(f, "'{}'", s),
            Token::Number(s) => write!(f, "{}", s),

            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Eq => write!(f, "="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Lte => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Gte => write!(f, ">="),
        }
    }
}

/// Reserved keywords in declaration order.
pub const KEYWORDS: &[&str] = &[
    "select", "join", "before", "after", "first", "last", "using", "filter", "as",
];

/// Map an identifier string to a keyword token or return Ident.
fn keyword_or_ident(s: &str) -> Token<'_> {
    match s.to_ascii_lowercase().as_str() {
        "select" => Token::Select,
        "join" => Token::Join,
        "before" => Token::Before,
        "after" => Token::After,
        "first" => Token::First,
        "last" => Token::Last,
        "using" => Token::Using,
        "filter" => Token::Filter,
        "as" => Token::As,
        _ => Token::Ident(s),
    }
}

/// Create a lexer for EEQL.
///
/// Returns a parser that tokenizes the input string into a sequence of
/// tokens with span information, skipping whitespace and `--` comments.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let ident = text::ident().map(keyword_or_ident);

    // Either quote style; no escapes inside.
    let string_lit = choice((
        just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\'')),
        just('"')
            .ignore_then(none_of('"').repeated().to_slice())
            .then_ignore(just('"')),
    ))
    .map(Token::StringLit);

    let number = just('-')
        .or_not()
        .then(text::digits(10))
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(Token::Number);

    // Multi-char operators first.
    let symbol = choice((
        just("!=").to(Token::NotEq),
        just("<>").to(Token::NotEq),
        just("<=").to(Token::Lte),
        just(">=").to(Token::Gte),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('=').to(Token::Eq),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
    ));

    let comment = just("--")
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();

    let token = choice((ident, string_lit, number, symbol)).map_with(|tok, e| (tok, e.span()));

    token
        .padded_by(comment.padded().repeated())
        .padded()
        .repeated()
        .collect()
        .padded_by(comment.padded().repeated())
        .padded()
        .then_ignore(end())
}

/// Lex a source string into tokens.
///
/// Returns Ok with the token list on success, or Err with the lex errors.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, SimpleSpan)>, Vec<Rich<'_, char>>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(tokens.unwrap_or_default())
    } else {
        Err(errs)
    }
}
