///
/// Parser Module - nom-based Token Parsing
///
/// This module provides the parser for the pisuke language.
/// It uses nom parser combinators to parse a stream of tokens into an AST.
///
/// The parser is structured as follows:
/// - input: TokenStream type for nom integration
/// - combinators: Reusable token-matching combinators and the error type
/// - types: `type` definition parsing
/// - expressions: Expression parsing with Pratt precedence
/// - statements: Statement parsing
///
/// Entry point: parse() takes tokens plus the text they were lexed from and
/// returns a Program together with every error found. A failed statement
/// does not stop the run; the parser resynchronizes and keeps going.
///

mod combinators;
mod expressions;
mod input;
mod statements;
mod types;

pub use combinators::{PError, PErrorKind};
pub use input::TokenStream;

use crate::ast::Program;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::source::Span;

use combinators::is_eof;
use statements::parse_statement;

pub struct ParseResult {
    pub ast: Program,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

pub fn parse(tokens: &[Token], source: &str) -> ParseResult {
    let mut statements = Vec::with_capacity(32);
    let mut errors = Vec::with_capacity(4);
    let mut input = TokenStream::new(tokens, source);

    while !is_eof(input) {
        match parse_statement(input) {
            Ok((rest, stmt)) => {
                statements.push(stmt);
                input = rest;
            }
            Err(e) => {
                let (error, err_offset) = match &e {
                    nom::Err::Error(pe) | nom::Err::Failure(pe) => (
                        ParseError::new(pe.message(), pe.span()),
                        pe.input.start.saturating_sub(input.start),
                    ),
                    nom::Err::Incomplete(_) => (
                        ParseError::new("unexpected end of input", input.current_span()),
                        0,
                    ),
                };
                tracing::debug!(message = %error.message, "parse error, resynchronizing");
                errors.push(error);
                input = input.advance(resync_point(input, err_offset));
            }
        }
    }

    let span = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => Span::dummy(),
    };

    ParseResult {
        ast: Program::new(statements, span),
        errors,
    }
}

/// Number of tokens to drop after a statement failed at `err_offset` tokens
/// past its start. At least one token is always dropped. The parser restarts
/// at the first statement keyword, or the first token opening a line at
/// brace depth zero, found at or after the failing token.
fn resync_point(input: TokenStream, err_offset: usize) -> usize {
    let from = err_offset.max(1);
    let mut depth = 0usize;

    for (i, tok) in input.tokens.iter().enumerate() {
        if i >= from {
            if tok.kind == TokenKind::Eof {
                return i;
            }
            if depth == 0 && (is_statement_keyword(tok.kind) || input.starts_line(i)) {
                return i;
            }
        }
        match tok.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    input.tokens.len()
}

fn is_statement_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Keyword(Keyword::Let | Keyword::Const | Keyword::Type | Keyword::Return)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{render_program, Expression, Statement};
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> ParseResult {
        let (tokens, _interner) = tokenize(source);
        parse(&tokens, source)
    }

    #[test]
    fn test_parse_empty() {
        let result = parse_str("");
        assert!(result.errors.is_empty());
        assert!(result.ast.statements.is_empty());
    }

    #[test]
    fn test_parse_statements_without_terminators() {
        let result = parse_str("let a = 1 let b = a\nprint(a, b)");
        assert!(result.errors.is_empty(), "Errors: {:?}", result.errors);
        assert_eq!(result.ast.statements.len(), 3);
    }

    #[test]
    fn test_parse_named_function() {
        let result = parse_str("fn add(a: int, b: int): int {\n  return a + b\n}\nadd(1, 2)");
        assert!(result.errors.is_empty(), "Errors: {:?}", result.errors);
        assert_eq!(result.ast.declared_functions().count(), 1);
        assert!(matches!(
            result.ast.statements[1],
            Statement::Expression(ref s) if matches!(s.expr, Expression::Call(_))
        ));
    }

    #[test]
    fn test_parse_precedence_round_trip() {
        let source = "let x = 1 + 2 * 3";
        let (tokens, interner) = tokenize(source);
        let result = parse(&tokens, source);
        assert_eq!(render_program(&result.ast, &interner), "let x = (1 + (2 * 3))\n");
    }

    #[test]
    fn test_multiple_errors_in_one_run() {
        let result = parse_str("let = 5\nlet y = +\nlet z = 3");
        assert_eq!(result.errors.len(), 2, "Errors: {:?}", result.errors);
        assert_eq!(result.errors[0].message, "expected identifier, found '='");
        assert_eq!(result.errors[1].message, "expected expression, found '+'");
        assert_eq!(result.ast.statements.len(), 1);
    }

    #[test]
    fn test_recovery_skips_to_next_line() {
        let result = parse_str("print(1 2)\nprint(3)");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.ast.statements.len(), 1);
    }

    #[test]
    fn test_recovery_skips_whole_broken_block() {
        let source = "let f = fn() {\n  let x = +\n  print(x)\n}\nlet ok = 1";
        let result = parse_str(source);
        assert!(!result.errors.is_empty());
        let last = result.ast.statements.last().expect("statement after recovery");
        assert!(matches!(last, Statement::Let(_)));
    }

    #[test]
    fn test_illegal_token_message() {
        let result = parse_str("let x = @");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "illegal token '@'");
    }

    #[test]
    fn test_integer_out_of_range() {
        let result = parse_str("let big = 99999999999999999999");
        assert_eq!(result.errors[0].message, "integer literal out of range");
    }
}
