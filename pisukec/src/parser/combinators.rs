//!
//! Base Combinators for Token Parsing
//!
//! Reusable nom combinators for matching tokens, keywords, identifiers and
//! literals, plus the error type every parser function returns.
//!

use lasso::Spur;
use nom::error::{ErrorKind, ParseError};
use nom::{IResult, InputTake};

use crate::ast::Ident;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::source::Span;

use super::input::TokenStream;

pub type PResult<'a, O> = IResult<TokenStream<'a>, O, PError<'a>>;

#[derive(Debug, Clone)]
pub struct PError<'a> {
    pub input: TokenStream<'a>,
    pub kind: PErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PErrorKind {
    Expected(TokenKind),
    ExpectedIdent,
    ExpectedExpr,
    ExpectedTypeName,
    ExpectedMapKey,
    IntOutOfRange,
    Nom(ErrorKind),
}

impl<'a> PError<'a> {
    pub fn new(input: TokenStream<'a>, kind: PErrorKind) -> Self {
        Self { input, kind }
    }

    pub fn span(&self) -> Span {
        self.input.current_span()
    }

    /// Human-readable description naming what was expected and what was found.
    pub fn message(&self) -> String {
        let found = match self.input.first() {
            Some(tok) => describe_token(tok, self.input.span_text(tok.span)),
            None => "end of input".to_string(),
        };
        if let Some(tok) = self.input.first() {
            if tok.kind == TokenKind::Illegal {
                return found;
            }
        }
        match &self.kind {
            PErrorKind::Expected(kind) => format!("expected {}, found {}", kind, found),
            PErrorKind::ExpectedIdent => format!("expected identifier, found {}", found),
            PErrorKind::ExpectedExpr => format!("expected expression, found {}", found),
            PErrorKind::ExpectedTypeName => format!("expected type name, found {}", found),
            PErrorKind::ExpectedMapKey => {
                format!("expected map key (string or identifier), found {}", found)
            }
            PErrorKind::IntOutOfRange => "integer literal out of range".to_string(),
            PErrorKind::Nom(kind) => format!("unexpected {} ({:?})", found, kind),
        }
    }
}

fn describe_token(tok: &Token, text: &str) -> String {
    match tok.kind {
        TokenKind::Ident => format!("identifier '{}'", text),
        TokenKind::IntLit => format!("integer {}", text),
        TokenKind::StringLit => format!("string {}", text),
        TokenKind::Illegal => format!("illegal token '{}'", text),
        other => other.to_string(),
    }
}

impl<'a> ParseError<TokenStream<'a>> for PError<'a> {
    fn from_error_kind(input: TokenStream<'a>, kind: ErrorKind) -> Self {
        PError {
            input,
            kind: PErrorKind::Nom(kind),
        }
    }

    fn append(_input: TokenStream<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub fn fail<'a, O>(input: TokenStream<'a>, kind: PErrorKind) -> PResult<'a, O> {
    Err(nom::Err::Error(PError::new(input, kind)))
}

/// Past a committing token, a recoverable error becomes a hard failure so
/// enclosing `alt`s stop trying other branches.
pub fn committed<'a, O>(result: PResult<'a, O>) -> PResult<'a, O> {
    result.map_err(|e| match e {
        nom::Err::Error(e) => nom::Err::Failure(e),
        other => other,
    })
}

pub fn token(kind: TokenKind) -> impl Fn(TokenStream) -> PResult<Token> {
    move |input: TokenStream| match input.first() {
        Some(tok) if tok.kind == kind => {
            let (rest, _) = input.take_split(1);
            Ok((rest, *tok))
        }
        _ => fail(input, PErrorKind::Expected(kind)),
    }
}

pub fn keyword(kw: Keyword) -> impl Fn(TokenStream) -> PResult<Token> {
    token(TokenKind::Keyword(kw))
}

pub fn ident(input: TokenStream) -> PResult<Ident> {
    match input.first() {
        Some(Token {
            kind: TokenKind::Ident,
            span,
            symbol: Some(symbol),
        }) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, Ident::new(*symbol, *span)))
        }
        _ => fail(input, PErrorKind::ExpectedIdent),
    }
}

/// A type name in an annotation: any identifier.
pub fn type_name(input: TokenStream) -> PResult<Ident> {
    ident(input).map_err(|_| nom::Err::Error(PError::new(input, PErrorKind::ExpectedTypeName)))
}

pub fn int_lit(input: TokenStream) -> PResult<(i64, Span)> {
    match input.first() {
        Some(tok) if tok.kind == TokenKind::IntLit => {
            let Ok(value) = input.span_text(tok.span).parse::<i64>() else {
                return fail(input, PErrorKind::IntOutOfRange);
            };
            let (rest, _) = input.take_split(1);
            Ok((rest, (value, tok.span)))
        }
        _ => fail(input, PErrorKind::Expected(TokenKind::IntLit)),
    }
}

pub fn string_lit(input: TokenStream) -> PResult<(Spur, Span)> {
    match input.first() {
        Some(Token {
            kind: TokenKind::StringLit,
            span,
            symbol: Some(symbol),
        }) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, (*symbol, *span)))
        }
        _ => fail(input, PErrorKind::Expected(TokenKind::StringLit)),
    }
}

pub fn peek_token(input: TokenStream) -> Option<TokenKind> {
    input.first().map(|t| t.kind)
}

pub fn check(kind: TokenKind) -> impl Fn(TokenStream) -> bool {
    move |input: TokenStream| input.first().map(|t| t.kind == kind).unwrap_or(false)
}

pub fn is_eof(input: TokenStream) -> bool {
    input.is_empty() || input.first().map(|t| t.kind == TokenKind::Eof).unwrap_or(true)
}

/// `item (',' item)* ','? close`, the opening delimiter already consumed.
/// Returns the items and the span of the closing token.
pub fn comma_separated<'a, T, F>(
    mut input: TokenStream<'a>,
    close: TokenKind,
    mut item: F,
) -> PResult<'a, (Vec<T>, Span)>
where
    F: FnMut(TokenStream<'a>) -> PResult<'a, T>,
{
    let mut items = Vec::new();
    loop {
        if check(close)(input) {
            let (input, end) = token(close)(input)?;
            return Ok((input, (items, end.span)));
        }
        let (rest, value) = item(input)?;
        items.push(value);
        input = rest;
        if check(TokenKind::Comma)(input) {
            let (rest, _) = token(TokenKind::Comma)(input)?;
            input = rest;
        } else {
            let (input, end) = token(close)(input)?;
            return Ok((input, (items, end.span)));
        }
    }
}
