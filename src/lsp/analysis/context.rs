//! Completion context detection.
//!
//! Completion runs on half-typed text that usually does not parse, so the
//! context is read from a lightweight word scan of the text before the
//! cursor instead of from the AST.

/// The identifier fragment being typed at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub text: &'a str,
    /// Byte offset where the fragment starts.
    pub start: usize,
}

/// What the grammar expects at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Nothing but whitespace and comments before the fragment.
    Start,
    /// After `select` or `join before|after`, optionally followed by a selector.
    EventName {
        /// `first` or `last` was already written.
        selector_typed: bool,
    },
    /// Inside a clause's parentheses.
    Clause {
        /// Event named by the clause header, when one was written.
        event: Option<String>,
        /// The cursor is in the clause's `using` list.
        in_using: bool,
    },
    /// Anywhere else.
    Other,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The identifier characters immediately before `offset`.
pub fn fragment_at(text: &str, offset: usize) -> Fragment<'_> {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident_char(c))
        .last()
        .map_or(offset, |(i, _)| i);
    Fragment {
        text: &text[start..offset],
        start,
    }
}

/// The identifier touching `offset` on either side, with its byte range.
pub fn word_at(text: &str, offset: usize) -> Option<(&str, std::ops::Range<usize>)> {
    let start = fragment_at(text, offset).start;
    let end = text[start..]
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(text.len(), |(i, _)| start + i);
    (end > start).then(|| (&text[start..end], start..end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Word(&'a str),
    Open,
    Close,
    Comma,
    Other,
}

/// Split text into words and punctuation, skipping whitespace, comments
/// and the contents of string literals (closed or not).
fn scan(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '-' if matches!(chars.peek(), Some((_, '-'))) => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '\'' | '"' => {
                for (_, q) in chars.by_ref() {
                    if q == c {
                        break;
                    }
                }
                pieces.push(Piece::Other);
            }
            '(' => pieces.push(Piece::Open),
            ')' => pieces.push(Piece::Close),
            ',' => pieces.push(Piece::Comma),
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if !is_ident_char(n) {
                        break;
                    }
                    end = j + n.len_utf8();
                    chars.next();
                }
                pieces.push(Piece::Word(&text[i..end]));
            }
            _ => pieces.push(Piece::Other),
        }
    }
    pieces
}

fn is_word(piece: Option<&Piece<'_>>, keywords: &[&str]) -> bool {
    matches!(piece, Some(Piece::Word(w)) if keywords.iter().any(|k| w.eq_ignore_ascii_case(k)))
}

fn is_keyword(word: &str) -> bool {
    crate::dsl::lexer::KEYWORDS
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k))
}

/// Decide what may be typed at `offset`.
pub fn detect_context(text: &str, offset: usize) -> CompletionContext {
    let fragment = fragment_at(text, offset);
    let pieces = scan(&text[..fragment.start]);
    if pieces.is_empty() {
        return CompletionContext::Start;
    }

    let mut depth = 0usize;
    let mut event: Option<String> = None;
    let mut clause_start = 0;
    for (i, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Open => {
                if depth == 0 {
                    clause_start = i + 1;
                }
                depth += 1;
            }
            Piece::Close => depth = depth.saturating_sub(1),
            Piece::Word(w) if depth == 0 => {
                if w.eq_ignore_ascii_case("select") || w.eq_ignore_ascii_case("join") {
                    event = None;
                } else if !is_keyword(w) {
                    event = Some((*w).to_string());
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        let inside = &pieces[clause_start..];
        let in_using = depth == 1
            && is_word(inside.first(), &["using"])
            && inside[1..].iter().all(|p| match p {
                Piece::Word(w) => !is_keyword(w),
                Piece::Comma => true,
                _ => false,
            });
        return CompletionContext::Clause { event, in_using };
    }

    let last = pieces.last();
    let before_last = pieces.len().checked_sub(2).and_then(|i| pieces.get(i));
    let headers = ["select", "before", "after"];
    if is_word(last, &headers) {
        CompletionContext::EventName {
            selector_typed: false,
        }
    } else if is_word(last, &["first", "last"]) && is_word(before_last, &headers) {
        CompletionContext::EventName {
            selector_typed: true,
        }
    } else {
        CompletionContext::Other
    }
}
