//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens render to ANSI SQL. Formatting tokens (`Newline`, `Indent`) are
//! interpreted by the [`Layout`] a stream is serialized with.

/// How formatting tokens are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One clause per line, select lists indented.
    #[default]
    Pretty,
    /// Everything on a single line.
    Compact,
}

/// SQL Token - every element the query builder emits.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    As,
    On,
    Join,
    Inner,
    Left,
    GroupBy,
    OrderBy,
    Asc,
    Desc,
    Distinct,
    With,

    // === Window Function Keywords ===
    Over,
    PartitionBy,
    Rows,
    Between,
    Unbounded,
    Preceding,
    Following,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Simple identifier (column, alias, CTE name)
    Ident(String),
    /// Dotted identifier such as `analytics.user_signed_up`, one part per segment
    QualifiedIdent(Vec<String>),
    /// Integer literal
    LitInt(i64),
    /// Float literal
    LitFloat(f64),
    /// String literal
    LitString(String),

    /// Function name, rendered upper-case
    FunctionName(String),
}

/// Quote identifier with double quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote string with single quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl Token {
    /// Serialize this token. Formatting tokens depend on `layout`.
    pub fn serialize(&self, layout: Layout) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::With => "WITH".into(),

            // Window function keywords
            Token::Over => "OVER".into(),
            Token::PartitionBy => "PARTITION BY".into(),
            Token::Rows => "ROWS".into(),
            Token::Between => "BETWEEN".into(),
            Token::Unbounded => "UNBOUNDED".into(),
            Token::Preceding => "PRECEDING".into(),
            Token::Following => "FOLLOWING".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => match layout {
                Layout::Pretty => "\n".into(),
                Layout::Compact => " ".into(),
            },
            Token::Indent(n) => match layout {
                Layout::Pretty => "  ".repeat(*n),
                Layout::Compact => String::new(),
            },

            // Dynamic
            Token::Ident(name) => quote_identifier(name),
            Token::QualifiedIdent(parts) => parts
                .iter()
                .map(|p| quote_identifier(p))
                .collect::<Vec<_>>()
                .join("."),
            Token::LitInt(n) => n.to_string(),
            // ryu renders non-finite values as `NaN`/`inf`; the compiler
            // rejects those before they get here.
            Token::LitFloat(f) => {
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitString(s) => quote_string(s),

            Token::FunctionName(name) => name.to_uppercase(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Serialize all tokens to a SQL string.
    ///
    /// In compact layout a line break directly inside parentheses renders
    /// as nothing, so `(\nSELECT ...\n)` becomes `(SELECT ...)`.
    pub fn serialize(&self, layout: Layout) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if layout == Layout::Compact && *token == Token::Newline {
                let after_paren = out.ends_with('(');
                let before_paren = self.tokens.get(i + 1) == Some(&Token::RParen);
                if after_paren || before_paren {
                    continue;
                }
            }
            out.push_str(&token.serialize(layout));
        }
        out
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_serialize() {
        assert_eq!(Token::Select.serialize(Layout::Pretty), "SELECT");
        assert_eq!(Token::PartitionBy.serialize(Layout::Compact), "PARTITION BY");
    }

    #[test]
    fn test_ident_quoting() {
        assert_eq!(
            Token::Ident("users".into()).serialize(Layout::Pretty),
            "\"users\""
        );
        assert_eq!(
            Token::Ident("we\"ird".into()).serialize(Layout::Pretty),
            "\"we\"\"ird\""
        );
    }

    #[test]
    fn test_qualified_ident() {
        let tok = Token::QualifiedIdent(vec!["analytics".into(), "logins".into()]);
        assert_eq!(tok.serialize(Layout::Pretty), "\"analytics\".\"logins\"");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            Token::LitString("it's".into()).serialize(Layout::Pretty),
            "'it''s'"
        );
    }

    #[test]
    fn test_token_stream() {
        let mut ts = TokenStream::new();
        ts.push(Token::Select)
            .space()
            .push(Token::Ident("name".into()))
            .space()
            .push(Token::From)
            .space()
            .push(Token::Ident("users".into()));

        assert_eq!(ts.serialize(Layout::Pretty), "SELECT \"name\" FROM \"users\"");
    }

    #[test]
    fn test_layouts() {
        let mut ts = TokenStream::new();
        ts.lparen()
            .newline()
            .push(Token::Select)
            .newline()
            .indent(1)
            .push(Token::Star)
            .newline()
            .rparen();

        assert_eq!(ts.serialize(Layout::Pretty), "(\nSELECT\n  *\n)");
        assert_eq!(ts.serialize(Layout::Compact), "(SELECT *)");
    }

    #[test]
    fn test_float_serialize() {
        assert_eq!(Token::LitFloat(3.14).serialize(Layout::Pretty), "3.14");
        assert_eq!(Token::LitFloat(1.0).serialize(Layout::Pretty), "1.0");
        assert_eq!(Token::LitFloat(-42.5).serialize(Layout::Pretty), "-42.5");
    }
}
