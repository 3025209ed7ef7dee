///
/// Type Definition Parser
///
/// Parses `type Name = { field: Type, nested: { ... } }`. A field's type is
/// either a name or another brace-delimited body, which becomes a nested
/// TypeDefinition named after the field.
///

use nom::branch::alt;

use crate::ast::{Field, FieldType, Ident, TypeDefinition};
use crate::lexer::{Keyword, TokenKind};

use super::combinators::*;
use super::input::TokenStream;

pub fn parse_type_definition(input: TokenStream) -> PResult<TypeDefinition> {
    let (input, start) = keyword(Keyword::Type)(input)?;
    let (input, name) = ident(input)?;
    let (input, _) = token(TokenKind::Eq)(input)?;
    let (input, mut def) = parse_type_body(input, name)?;
    def.span = start.span.merge(def.span);
    Ok((input, def))
}

fn parse_type_body(input: TokenStream, name: Ident) -> PResult<TypeDefinition> {
    let (input, open) = token(TokenKind::LBrace)(input)?;
    let (input, (fields, close)) =
        committed(comma_separated(input, TokenKind::RBrace, parse_field))?;
    Ok((
        input,
        TypeDefinition {
            name,
            fields,
            span: open.span.merge(close),
        },
    ))
}

fn nested_type(name: Ident) -> impl Fn(TokenStream) -> PResult<FieldType> {
    move |input: TokenStream| {
        let (input, def) = parse_type_body(input, name)?;
        Ok((input, FieldType::Nested(def)))
    }
}

fn named_type(input: TokenStream) -> PResult<FieldType> {
    let (input, ty) = type_name(input)?;
    Ok((input, FieldType::Named(ty)))
}

fn parse_field(input: TokenStream) -> PResult<Field> {
    let (input, name) = ident(input)?;
    let (input, _) = token(TokenKind::Colon)(input)?;
    let (input, ty) = alt((nested_type(name), named_type))(input)?;

    let end = match &ty {
        FieldType::Named(ty) => ty.span,
        FieldType::Nested(def) => def.span,
    };
    Ok((
        input,
        Field {
            name,
            ty,
            span: name.span.merge(end),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn test_nested_type_definition() {
        let source = "type User = { id: int, name: { n: string, }, }";
        let (tokens, interner) = tokenize(source);
        let (_, def) = parse_type_definition(TokenStream::new(&tokens, source)).unwrap();

        assert_eq!(interner.resolve(&def.name.symbol), "User");
        assert_eq!(def.fields.len(), 2);
        let FieldType::Nested(ref nested) = def.fields[1].ty else {
            panic!("expected nested field");
        };
        assert_eq!(interner.resolve(&nested.name.symbol), "name");
        assert_eq!(nested.fields.len(), 1);
    }

    #[test]
    fn test_field_needs_a_type() {
        let source = "type T = { a: 1 }";
        let (tokens, _) = tokenize(source);
        let err = parse_type_definition(TokenStream::new(&tokens, source)).unwrap_err();
        let (nom::Err::Error(e) | nom::Err::Failure(e)) = err else {
            panic!("expected a parse error");
        };
        assert_eq!(e.kind, PErrorKind::ExpectedTypeName);
    }
}
