//!
//! Expression Shapes
//!
//! A Shape is what the generator statically knows about the Go value an
//! expression produces. It decides how member access, indexing and
//! arithmetic are lowered:
//!
//! - Record: a Go struct; members are `.Field`
//! - Map: a `map[string]interface{}`; members are `["field"]`
//! - List: a `[]interface{}`
//! - Int / String: Go primitives
//! - Func: a Go func value
//! - Any: an `interface{}` whose dynamic type must be asserted before use
//!
//! Shapes come from literals, annotated declarations, typed parameters,
//! handler request maps, and the field types of known records.
//!

use crate::ast::{Expression, Field, FieldType, Ident, InfixOp};

use super::GoGenerator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    Record(&'a crate::ast::TypeDefinition),
    Map,
    List,
    Int,
    String,
    Func,
    Any,
}

impl<'a> Shape<'a> {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Shape::Int | Shape::String)
    }

    /// The type assertion that turns an `interface{}` into this shape.
    pub fn assertion(&self) -> Option<&'static str> {
        match self {
            Shape::Int => Some(".(int)"),
            Shape::String => Some(".(string)"),
            Shape::Map => Some(".(map[string]interface{})"),
            Shape::List => Some(".([]interface{})"),
            _ => None,
        }
    }
}

impl<'a> GoGenerator<'a> {
    /// The shape a type annotation declares.
    pub(super) fn annotation_shape(&self, ty: Option<Ident>) -> Shape<'a> {
        let Some(ty) = ty else { return Shape::Any };
        match self.resolve(ty.symbol) {
            "int" => Shape::Int,
            "string" => Shape::String,
            _ => self
                .symbols()
                .get_type(ty.symbol)
                .map(Shape::Record)
                .unwrap_or(Shape::Any),
        }
    }

    pub(super) fn field_shape(&self, field: &'a Field) -> Shape<'a> {
        match &field.ty {
            FieldType::Named(ty) => self.annotation_shape(Some(*ty)),
            FieldType::Nested(def) => Shape::Record(def),
        }
    }

    pub(super) fn shape_of(&self, expr: &'a Expression) -> Shape<'a> {
        match expr {
            Expression::Identifier(ident) => self.lookup(ident.symbol),
            Expression::Int(_) => Shape::Int,
            Expression::String(_) => Shape::String,
            Expression::List(_) => Shape::List,
            Expression::Map(_) => Shape::Map,
            Expression::Function(_) => Shape::Func,
            Expression::Call(call) => match call.callee.as_ident() {
                Some(callee) if !self.is_bound(callee.symbol) => self
                    .symbols()
                    .get_function(callee.symbol)
                    .map(|sig| self.annotation_shape(sig.return_ty))
                    .unwrap_or(Shape::Any),
                _ => Shape::Any,
            },
            Expression::Member(member) => match self.shape_of(&member.object) {
                Shape::Record(def) => def
                    .field(member.property.symbol)
                    .map(|field| self.field_shape(field))
                    .unwrap_or(Shape::Any),
                _ => Shape::Any,
            },
            Expression::Index(_) => Shape::Any,
            Expression::Infix(infix) => {
                let left = self.shape_of(&infix.left);
                let right = self.shape_of(&infix.right);
                match (infix.op, left, right) {
                    (InfixOp::Add, Shape::String, _) | (InfixOp::Add, _, Shape::String) => Shape::String,
                    (_, Shape::Int, _) | (_, _, Shape::Int) => Shape::Int,
                    _ => Shape::Any,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::typechecker::SymbolTable;

    const SOURCE: &str = r#"
type User = { id: int, name: { n: string } }
fn age(): int { return 1 }
u.name.n
u.name
u.id
age()
"a" + u.id
u.id * 2
u.name.missing
req.query
"#;

    fn expr(stmt: &Statement) -> &Expression {
        match stmt {
            Statement::Expression(s) => &s.expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_shapes_follow_record_fields() {
        let (tokens, interner) = tokenize(SOURCE);
        let result = parse(&tokens, SOURCE);
        assert!(result.errors.is_empty(), "Parse errors: {:?}", result.errors);
        let program = result.ast;
        let symbols = SymbolTable::collect(&program);
        let mut g = GoGenerator::new(&interner, &symbols);

        let user = symbols.types().next().expect("User is registered");
        let u = interner.get("u").expect("u is interned");
        let req = interner.get("req").expect("req is interned");
        g.define(u, Shape::Record(user));
        g.define(req, Shape::Map);

        let shapes: Vec<Shape> = program.statements[2..]
            .iter()
            .map(|stmt| g.shape_of(expr(stmt)))
            .collect();

        assert_eq!(shapes[0], Shape::String);
        assert!(matches!(shapes[1], Shape::Record(def) if def.fields.len() == 1));
        assert_eq!(shapes[2], Shape::Int);
        assert_eq!(shapes[3], Shape::Int);
        assert_eq!(shapes[4], Shape::String);
        assert_eq!(shapes[5], Shape::Int);
        assert_eq!(shapes[6], Shape::Any);
        assert_eq!(shapes[7], Shape::Any);
    }

    #[test]
    fn test_assertions() {
        assert_eq!(Shape::Int.assertion(), Some(".(int)"));
        assert_eq!(Shape::Map.assertion(), Some(".(map[string]interface{})"));
        assert_eq!(Shape::Any.assertion(), None);
        assert!(Shape::String.is_primitive());
        assert!(!Shape::List.is_primitive());
    }
}
