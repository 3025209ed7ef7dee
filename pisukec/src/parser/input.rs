///
/// TokenStream Input Type for nom
///
/// A cursor over the token slice of one file. It carries the file's text so
/// that combinators can read literal text back out of spans, and so error
/// recovery can see where lines break (the lexer drops newlines).
///
/// Only the nom traits the parser relies on are implemented: `InputLength`
/// for the list combinators and `InputTake` for advancing.
///

use nom::{InputLength, InputTake};

use crate::lexer::Token;
use crate::source::Span;

#[derive(Debug, Clone, Copy)]
pub struct TokenStream<'a> {
    pub tokens: &'a [Token],
    pub source: &'a str,
    /// Index of `tokens[0]` in the full token slice.
    pub start: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str) -> Self {
        Self { tokens, source, start: 0 }
    }

    pub fn span_text(&self, span: Span) -> &'a str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn first(&self) -> Option<&'a Token> {
        self.tokens.first()
    }

    pub fn get(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    pub fn current_span(&self) -> Span {
        self.tokens.first().map(|t| t.span).unwrap_or(Span::dummy())
    }

    /// Drop the first `count` tokens.
    pub fn advance(&self, count: usize) -> Self {
        let count = count.min(self.tokens.len());
        TokenStream {
            tokens: &self.tokens[count..],
            source: self.source,
            start: self.start + count,
        }
    }

    /// Whether a line break separates `tokens[index]` from the token before it.
    pub fn starts_line(&self, index: usize) -> bool {
        let Some(tok) = self.tokens.get(index) else {
            return false;
        };
        let gap_start = match index.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(prev) => prev.span.end as usize,
            None => return true,
        };
        self.source
            .get(gap_start..tok.span.start as usize)
            .is_some_and(|gap| memchr::memchr(b'\n', gap.as_bytes()).is_some())
    }
}

impl<'a> InputLength for TokenStream<'a> {
    fn input_len(&self) -> usize {
        self.tokens.len()
    }
}

impl<'a> InputTake for TokenStream<'a> {
    fn take(&self, count: usize) -> Self {
        TokenStream {
            tokens: &self.tokens[..count],
            source: self.source,
            start: self.start,
        }
    }

    fn take_split(&self, count: usize) -> (Self, Self) {
        let (prefix, suffix) = self.tokens.split_at(count);
        (
            TokenStream {
                tokens: suffix,
                source: self.source,
                start: self.start + count,
            },
            TokenStream {
                tokens: prefix,
                source: self.source,
                start: self.start,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn test_starts_line() {
        let source = "let x = 1\nprint(x)";
        let (tokens, _) = tokenize(source);
        let input = TokenStream::new(&tokens, source);
        assert!(input.starts_line(0));
        assert!(!input.starts_line(1));
        assert!(input.starts_line(4));
        assert!(!input.starts_line(5));
    }

    #[test]
    fn test_advance_tracks_offset() {
        let source = "a b c";
        let (tokens, _) = tokenize(source);
        let input = TokenStream::new(&tokens, source).advance(2);
        assert_eq!(input.start, 2);
        assert_eq!(input.span_text(input.current_span()), "c");
    }
}
