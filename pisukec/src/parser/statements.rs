///
/// Statement Parser
///
/// Parses statements using nom combinators. Statements need no terminator:
/// an expression ends where the next token cannot continue it, so
/// `let a = 1 let b = 2` and the same on two lines parse alike.
///

use crate::ast::*;
use crate::lexer::{Keyword, TokenKind};
use crate::source::{Span, Spanned};

use super::combinators::*;
use super::expressions::parse_expression;
use super::input::TokenStream;
use super::types::parse_type_definition;

pub fn parse_statement(input: TokenStream) -> PResult<Statement> {
    match peek_token(input) {
        Some(TokenKind::Keyword(Keyword::Let)) => {
            let (input, (name, ty, value, span)) = parse_binding(input, Keyword::Let)?;
            Ok((input, Statement::Let(LetStmt { name, ty, value, span })))
        }
        Some(TokenKind::Keyword(Keyword::Const)) => {
            let (input, (name, ty, value, span)) = parse_binding(input, Keyword::Const)?;
            Ok((input, Statement::Const(ConstStmt { name, ty, value, span })))
        }
        Some(TokenKind::Keyword(Keyword::Return)) => parse_return_stmt(input),
        Some(TokenKind::Keyword(Keyword::Type)) => {
            let (input, def) = parse_type_definition(input)?;
            Ok((input, Statement::TypeDef(def)))
        }
        Some(TokenKind::LBrace) => {
            let (input, block) = parse_block(input)?;
            Ok((input, Statement::Block(block)))
        }
        _ => parse_expression_stmt(input),
    }
}

/// `let|const name [: Type] = value`
fn parse_binding(
    input: TokenStream,
    kw: Keyword,
) -> PResult<(Ident, Option<Ident>, Expression, Span)> {
    let (input, start) = keyword(kw)(input)?;
    let (input, name) = ident(input)?;

    let (input, ty) = if check(TokenKind::Colon)(input) {
        let (input, _) = token(TokenKind::Colon)(input)?;
        let (input, ty) = type_name(input)?;
        (input, Some(ty))
    } else {
        (input, None)
    };

    let (input, _) = token(TokenKind::Eq)(input)?;
    let (input, value) = parse_expression(input)?;
    let span = start.span.merge(value.span());
    Ok((input, (name, ty, value, span)))
}

fn parse_return_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Return)(input)?;

    if check(TokenKind::RBrace)(input) || is_eof(input) {
        return Ok((
            input,
            Statement::Return(ReturnStmt {
                value: None,
                span: start.span,
            }),
        ));
    }

    let (input, value) = parse_expression(input)?;
    let span = start.span.merge(value.span());
    Ok((
        input,
        Statement::Return(ReturnStmt {
            value: Some(value),
            span,
        }),
    ))
}

fn parse_expression_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, expr) = parse_expression(input)?;
    let span = expr.span();
    Ok((input, Statement::Expression(ExprStmt { expr, span })))
}

pub fn parse_block(input: TokenStream) -> PResult<BlockStmt> {
    let (mut input, open) = token(TokenKind::LBrace)(input)?;
    let mut statements = Vec::new();

    loop {
        if check(TokenKind::RBrace)(input) {
            let (rest, close) = token(TokenKind::RBrace)(input)?;
            return Ok((
                rest,
                BlockStmt {
                    statements,
                    span: open.span.merge(close.span),
                },
            ));
        }
        if is_eof(input) {
            return fail(input, PErrorKind::Expected(TokenKind::RBrace));
        }
        let (rest, stmt) = parse_statement(input)?;
        statements.push(stmt);
        input = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_one(source: &str) -> (Statement, lasso::Rodeo) {
        let (tokens, interner) = tokenize(source);
        let (rest, stmt) = parse_statement(TokenStream::new(&tokens, source)).unwrap();
        assert!(is_eof(rest), "trailing input after statement");
        (stmt, interner)
    }

    #[test]
    fn test_annotated_let() {
        let (stmt, interner) = parse_one(r#"let u: User = { "id": 1 }"#);
        let Statement::Let(let_stmt) = stmt else {
            panic!("expected let");
        };
        assert_eq!(interner.resolve(&let_stmt.name.symbol), "u");
        assert_eq!(interner.resolve(&let_stmt.ty.unwrap().symbol), "User");
        assert!(matches!(let_stmt.value, Expression::Map(_)));
    }

    #[test]
    fn test_const_without_annotation() {
        let (stmt, _) = parse_one("const port = 8080");
        let Statement::Const(c) = stmt else {
            panic!("expected const");
        };
        assert!(c.ty.is_none());
        assert!(matches!(c.value, Expression::Int(IntLiteral { value: 8080, .. })));
    }

    #[test]
    fn test_bare_return_in_block() {
        let (stmt, _) = parse_one("{ return }");
        let Statement::Block(block) = stmt else {
            panic!("expected block");
        };
        assert!(matches!(
            block.statements[0],
            Statement::Return(ReturnStmt { value: None, .. })
        ));
    }

    #[test]
    fn test_unclosed_block_fails() {
        let source = "{ let x = 1";
        let (tokens, _) = tokenize(source);
        assert!(parse_statement(TokenStream::new(&tokens, source)).is_err());
    }
}
