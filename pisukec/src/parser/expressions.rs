///
/// Expression Parser
///
/// Parses expressions using nom combinators with Pratt-style precedence.
///
/// Precedence, lowest first:
/// - `+`
/// - `*`
/// - postfix: call `f(x)`, index `a[i]`, member `a.b`
///
/// Both infix operators are left-associative.
///

use crate::ast::*;
use crate::lexer::{Keyword, TokenKind};
use crate::source::Spanned;

use super::combinators::*;
use super::input::TokenStream;
use super::statements::parse_block;

pub fn parse_expression(input: TokenStream) -> PResult<Expression> {
    pratt_expr(input, 0)
}

fn peek_infix_op(input: TokenStream) -> Option<InfixOp> {
    match peek_token(input)? {
        TokenKind::Plus => Some(InfixOp::Add),
        TokenKind::Star => Some(InfixOp::Mul),
        _ => None,
    }
}

fn pratt_expr(input: TokenStream, min_prec: u8) -> PResult<Expression> {
    let (mut input, mut left) = parse_postfix(input)?;

    while let Some(op) = peek_infix_op(input) {
        let prec = op.precedence();
        if prec < min_prec {
            break;
        }

        let (new_input, right) = pratt_expr(input.advance(1), prec + 1)?;
        input = new_input;

        let span = left.span().merge(right.span());
        left = Expression::Infix(InfixExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        });
    }

    Ok((input, left))
}

fn parse_postfix(input: TokenStream) -> PResult<Expression> {
    let (mut input, mut expr) = parse_atom(input)?;

    loop {
        match peek_token(input) {
            Some(TokenKind::LParen) => {
                let (rest, (args, close)) =
                    comma_separated(input.advance(1), TokenKind::RParen, parse_expression)?;
                let span = expr.span().merge(close);
                expr = Expression::Call(CallExpr {
                    callee: Box::new(expr),
                    args,
                    span,
                });
                input = rest;
            }
            Some(TokenKind::LBracket) => {
                let (rest, index) = parse_expression(input.advance(1))?;
                let (rest, close) = token(TokenKind::RBracket)(rest)?;
                let span = expr.span().merge(close.span);
                expr = Expression::Index(IndexExpr {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                });
                input = rest;
            }
            Some(TokenKind::Dot) => {
                let (rest, property) = ident(input.advance(1))?;
                let span = expr.span().merge(property.span);
                expr = Expression::Member(MemberExpr {
                    object: Box::new(expr),
                    property,
                    span,
                });
                input = rest;
            }
            _ => break,
        }
    }

    Ok((input, expr))
}

fn parse_atom(input: TokenStream) -> PResult<Expression> {
    match peek_token(input) {
        Some(TokenKind::Ident) => {
            let (input, name) = ident(input)?;
            Ok((input, Expression::Identifier(name)))
        }
        Some(TokenKind::IntLit) => {
            let (input, (value, span)) = int_lit(input)?;
            Ok((input, Expression::Int(IntLiteral { value, span })))
        }
        Some(TokenKind::StringLit) => {
            let (input, (value, span)) = string_lit(input)?;
            Ok((input, Expression::String(StringLiteral { value, span })))
        }
        Some(TokenKind::LBracket) => parse_list_literal(input),
        Some(TokenKind::LBrace) => parse_map_literal(input),
        Some(TokenKind::LParen) => parse_grouped(input),
        Some(TokenKind::Keyword(Keyword::Fn)) => {
            let (input, func) = parse_function_literal(input)?;
            Ok((input, Expression::Function(func)))
        }
        _ => fail(input, PErrorKind::ExpectedExpr),
    }
}

fn parse_grouped(input: TokenStream) -> PResult<Expression> {
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, inner) = parse_expression(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    Ok((input, inner))
}

fn parse_list_literal(input: TokenStream) -> PResult<Expression> {
    let (input, open) = token(TokenKind::LBracket)(input)?;
    let (input, (elements, close)) =
        comma_separated(input, TokenKind::RBracket, parse_expression)?;
    Ok((
        input,
        Expression::List(ListLiteral {
            elements,
            span: open.span.merge(close),
        }),
    ))
}

fn parse_map_literal(input: TokenStream) -> PResult<Expression> {
    let (input, open) = token(TokenKind::LBrace)(input)?;
    let (input, (entries, close)) = comma_separated(input, TokenKind::RBrace, parse_map_entry)?;
    Ok((
        input,
        Expression::Map(MapLiteral {
            entries,
            span: open.span.merge(close),
        }),
    ))
}

fn parse_map_entry(input: TokenStream) -> PResult<MapEntry> {
    let (input, key) = match peek_token(input) {
        Some(TokenKind::StringLit) => {
            let (input, (value, span)) = string_lit(input)?;
            (input, MapKey::String(StringLiteral { value, span }))
        }
        Some(TokenKind::Ident) => {
            let (input, name) = ident(input)?;
            (input, MapKey::Ident(name))
        }
        _ => return fail(input, PErrorKind::ExpectedMapKey),
    };
    let (input, _) = token(TokenKind::Colon)(input)?;
    let (input, value) = parse_expression(input)?;

    let key_span = match key {
        MapKey::String(s) => s.span,
        MapKey::Ident(i) => i.span,
    };
    let span = key_span.merge(value.span());
    Ok((input, MapEntry { key, value, span }))
}

/// `fn [name](p [: T], ...) [: R] { ... }`
pub fn parse_function_literal(input: TokenStream) -> PResult<FunctionLiteral> {
    let (input, start) = keyword(Keyword::Fn)(input)?;

    let (input, name) = if check(TokenKind::Ident)(input) {
        let (input, name) = ident(input)?;
        (input, Some(name))
    } else {
        (input, None)
    };

    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, (params, _)) = comma_separated(input, TokenKind::RParen, parse_parameter)?;

    let (input, return_ty) = if check(TokenKind::Colon)(input) {
        let (input, _) = token(TokenKind::Colon)(input)?;
        let (input, ty) = type_name(input)?;
        (input, Some(ty))
    } else {
        (input, None)
    };

    let (input, body) = parse_block(input)?;
    let span = start.span.merge(body.span);
    Ok((
        input,
        FunctionLiteral {
            name,
            params,
            return_ty,
            body,
            span,
        },
    ))
}

fn parse_parameter(input: TokenStream) -> PResult<Parameter> {
    let (input, name) = ident(input)?;
    if !check(TokenKind::Colon)(input) {
        return Ok((
            input,
            Parameter {
                name,
                ty: None,
                span: name.span,
            },
        ));
    }
    let (input, _) = token(TokenKind::Colon)(input)?;
    let (input, ty) = type_name(input)?;
    Ok((
        input,
        Parameter {
            name,
            ty: Some(ty),
            span: name.span.merge(ty.span),
        },
    ))
}
