//!
//! Lexer Module - Zero-Copy Tokenization
//!
//! This module turns pisuke source text into the token stream the parser
//! consumes. A `Lexer` is a single-use cursor over one text: it yields
//! tokens in order, ends with exactly one `Eof`, and cannot be rewound.
//! Lexing the same text again takes a fresh instance.
//!
//! Key design decisions:
//! - Zero-copy: Tokens carry spans into the source, no allocation per token
//! - String interning: Identifiers and string contents stored via lasso::Spur
//! - Whitespace/comments are skipped, the parser never sees trivia
//! - Unrecognized input becomes an `Illegal` token instead of an error;
//!   the parser decides how loudly to complain
//!
//! Token categories:
//! - Keywords: let, const, fn, type, return
//! - Identifiers: User-defined names (including `int`, `string`, `server`)
//! - Literals: Integers, double-quoted strings
//! - Punctuation: = + * ( ) . { } , : [ ]
//!

use std::fmt;

use crate::source::Span;
use lasso::{Rodeo, Spur};
use memchr::{memchr, memchr2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub symbol: Option<Spur>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            symbol: None,
        }
    }

    pub fn with_symbol(kind: TokenKind, span: Span, symbol: Spur) -> Self {
        Self {
            kind,
            span,
            symbol: Some(symbol),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// The raw source text this token was scanned from.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.span.start as usize..self.span.end as usize)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    IntLit,
    StringLit,

    Keyword(Keyword),

    Eq,
    Plus,
    Star,
    Dot,
    Comma,
    Colon,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Illegal,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::IntLit => write!(f, "integer"),
            TokenKind::StringLit => write!(f, "string"),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Illegal => write!(f, "illegal token"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

impl TokenKind {
    /// Upper-case tag used in token dumps.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Ident => "IDENT",
            TokenKind::IntLit => "INT",
            TokenKind::StringLit => "STRING",
            TokenKind::Keyword(Keyword::Let) => "LET",
            TokenKind::Keyword(Keyword::Const) => "CONST",
            TokenKind::Keyword(Keyword::Fn) => "FUNCTION",
            TokenKind::Keyword(Keyword::Type) => "TYPE",
            TokenKind::Keyword(Keyword::Return) => "RETURN",
            TokenKind::Eq => "ASSIGN",
            TokenKind::Plus => "PLUS",
            TokenKind::Star => "ASTERISK",
            TokenKind::Dot => "DOT",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Let,
    Const,
    Fn,
    Type,
    Return,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Fn => "fn",
            Keyword::Type => "type",
            Keyword::Return => "return",
        }
    }

    fn from_ident(text: &str) -> Option<Keyword> {
        match text {
            "let" => Some(Keyword::Let),
            "const" => Some(Keyword::Const),
            "fn" => Some(Keyword::Fn),
            "type" => Some(Keyword::Type),
            "return" => Some(Keyword::Return),
            _ => None,
        }
    }
}

/// Lex a whole text with a fresh interner.
pub fn tokenize(source: &str) -> (Vec<Token>, Rodeo) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.by_ref().collect();
    (tokens, lexer.into_interner())
}

/// Lex one file of a multi-file compilation into a shared interner.
pub fn tokenize_with(source: &str, file_id: u32, interner: &mut Rodeo) -> Vec<Token> {
    let mut lexer = Lexer::with_interner(source, file_id, std::mem::take(interner));
    let tokens = lexer.by_ref().collect();
    *interner = lexer.into_interner();
    tokens
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    interner: Rodeo,
    file_id: u32,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_interner(source, 0, Rodeo::default())
    }

    pub fn with_interner(source: &'a str, file_id: u32, interner: Rodeo) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
            file_id,
            done: false,
        }
    }

    pub fn into_interner(self) -> Rodeo {
        self.interner
    }

    #[inline(always)]
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline(always)]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline(always)]
    fn peek_byte2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32, self.file_id)
    }

    /// Skip whitespace and comments. `/* */` comments nest.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.pos += 1,
                Some(b'/') if self.peek_byte2() == Some(b'/') => {
                    match memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(offset) => self.pos += offset,
                        None => self.pos = self.bytes.len(),
                    }
                }
                Some(b'/') if self.peek_byte2() == Some(b'*') => {
                    self.pos += 2;
                    let mut depth = 1;
                    while depth > 0 && !self.is_eof() {
                        match (self.peek_byte(), self.peek_byte2()) {
                            (Some(b'/'), Some(b'*')) => {
                                self.pos += 2;
                                depth += 1;
                            }
                            (Some(b'*'), Some(b'/')) => {
                                self.pos += 2;
                                depth -= 1;
                            }
                            _ => self.pos += 1,
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Produce the next significant token. Once the input is exhausted every
    /// call returns `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;

        let Some(b) = self.peek_byte() else {
            return Token::new(TokenKind::Eof, self.span_from(start));
        };
        self.pos += 1;

        let kind = match b {
            b'=' => TokenKind::Eq,
            b'+' => TokenKind::Plus,
            b'*' => TokenKind::Star,
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'"' => return self.scan_string(start),

            b'0'..=b'9' => {
                while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
                TokenKind::IntLit
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => return self.scan_ident_or_keyword(start),

            _ if b > 127 => {
                // Step over the whole character so the span stays on a char boundary.
                self.pos = start;
                let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
                self.pos += width;
                TokenKind::Illegal
            }

            _ => TokenKind::Illegal,
        };

        Token::new(kind, self.span_from(start))
    }

    fn scan_ident_or_keyword(&mut self, start: usize) -> Token {
        while matches!(
            self.peek_byte(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.pos += 1;
        }

        let span = self.span_from(start);
        let text = &self.source[start..self.pos];
        match Keyword::from_ident(text) {
            Some(kw) => Token::new(TokenKind::Keyword(kw), span),
            None => {
                let symbol = self.interner.get_or_intern(text);
                Token::with_symbol(TokenKind::Ident, span, symbol)
            }
        }
    }

    fn scan_string(&mut self, start: usize) -> Token {
        loop {
            match memchr2(b'"', b'\\', &self.bytes[self.pos..]) {
                Some(offset) => {
                    if let Some(nl) = memchr(b'\n', &self.bytes[self.pos..self.pos + offset]) {
                        self.pos += nl;
                        return Token::new(TokenKind::Illegal, self.span_from(start));
                    }
                    self.pos += offset;
                    if self.bytes[self.pos] == b'"' {
                        self.pos += 1;
                        break;
                    }
                    self.pos += 1;
                    if !self.is_eof() {
                        self.pos += 1;
                    }
                }
                None => {
                    match memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(nl) => self.pos += nl,
                        None => self.pos = self.bytes.len(),
                    }
                    return Token::new(TokenKind::Illegal, self.span_from(start));
                }
            }
        }

        let raw = &self.source[start + 1..self.pos - 1];
        let symbol = if raw.contains('\\') {
            self.interner.get_or_intern(unescape(raw))
        } else {
            self.interner.get_or_intern(raw)
        };
        Token::with_symbol(TokenKind::StringLit, self.span_from(start), symbol)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.is_eof() {
            self.done = true;
        }
        Some(token)
    }
}

fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('0') => result.push('\0'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = tokenize(source);
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        let (tokens, _) = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_tokenize_punctuation() {
        assert_eq!(
            kinds("= + * ( ) . { } , : [ ]"),
            vec![
                TokenKind::Eq,
                TokenKind::Plus,
                TokenKind::Star,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Dot,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("let const fn type return server"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Keyword(Keyword::Const),
                TokenKind::Keyword(Keyword::Fn),
                TokenKind::Keyword(Keyword::Type),
                TokenKind::Keyword(Keyword::Return),
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_let_statement() {
        let source = "let u: User = { id: 1 }";
        let (tokens, interner) = tokenize(source);
        assert_eq!(tokens[1].text(source), "u");
        assert_eq!(interner.resolve(&tokens[3].symbol.unwrap()), "User");
        assert_eq!(tokens[8].kind, TokenKind::IntLit);
        assert_eq!(tokens[8].text(source), "1");
    }

    #[test]
    fn test_tokenize_string_escapes() {
        let (tokens, interner) = tokenize(r#""a\"b\n""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLit);
        assert_eq!(interner.resolve(&tokens[0].symbol.unwrap()), "a\"b\n");
    }

    #[test]
    fn test_unterminated_string_is_illegal() {
        assert_eq!(
            kinds("\"abc\nlet"),
            vec![TokenKind::Illegal, TokenKind::Keyword(Keyword::Let), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unknown_characters_do_not_abort() {
        assert_eq!(
            kinds("x - y é"),
            vec![
                TokenKind::Ident,
                TokenKind::Illegal,
                TokenKind::Ident,
                TokenKind::Illegal,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_tokenize_comments() {
        assert_eq!(
            kinds("x // comment\n/* outer /* inner */ */ y"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_lexer_is_single_use() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Ident));
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_shared_interner_across_files() {
        let mut interner = Rodeo::default();
        let a = tokenize_with("shared", 0, &mut interner);
        let b = tokenize_with("shared", 1, &mut interner);
        assert_eq!(a[0].symbol, b[0].symbol);
        assert_eq!(b[0].span.file_id, 1);
    }
}
