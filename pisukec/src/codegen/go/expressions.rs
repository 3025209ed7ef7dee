///
/// Expression Code Generation
///
/// Converts pisuke expressions to Go expressions:
/// - Literals: int, string, `[]interface{}` lists, `map[string]interface{}` maps
/// - Member access and indexing, lowered by the object's Shape
/// - Infix `+` and `*`, asserting `interface{}` operands next to primitives
/// - Function literals (see statements)
/// - Calls: `print`, the `server` builtins (see routes), and plain calls
///
/// Rendering never writes into a generator; each function returns the Go
/// text with the capabilities it needs.
///

use crate::ast::{CallExpr, Expression, IndexExpr, InfixExpr, MapLiteral, MemberExpr};
use crate::codegen::CodegenError;

use super::capabilities::{Capability, Rendered};
use super::routes::{lower_route, lower_serve, lower_static};
use super::shapes::Shape;
use super::statements::{render_as, render_function};
use super::types::{capitalize, go_quote};
use super::GoGenerator;

const BUILTIN_OBJECT: &str = "server";

pub(super) fn render_expression<'a>(
    g: &GoGenerator<'a>,
    expr: &'a Expression,
) -> Result<Rendered, CodegenError> {
    match expr {
        Expression::Identifier(ident) => Ok(Rendered::new(g.resolve(ident.symbol))),
        Expression::Int(lit) => Ok(Rendered::new(lit.value.to_string())),
        Expression::String(lit) => Ok(Rendered::new(go_quote(g.resolve(lit.value)))),
        Expression::List(list) => {
            let elements = render_all(g, &list.elements)?;
            Ok(Rendered::join(elements, ", ").map(|c| format!("[]interface{{}}{{{}}}", c)))
        }
        Expression::Map(map) => render_map(g, map),
        Expression::Index(index) => render_index(g, index),
        Expression::Member(member) => render_member(g, member),
        Expression::Infix(infix) => render_infix(g, infix),
        Expression::Function(func) => render_function(g, func, None),
        Expression::Call(call) => render_call(g, call),
    }
}

pub(super) fn render_all<'a>(
    g: &GoGenerator<'a>,
    exprs: &'a [Expression],
) -> Result<Vec<Rendered>, CodegenError> {
    exprs.iter().map(|e| render_expression(g, e)).collect()
}

/// Assert an `interface{}` value to the primitive the context expects.
pub(super) fn coerce(rendered: Rendered, from: Shape, to: Shape) -> Rendered {
    if from != Shape::Any || !to.is_primitive() {
        return rendered;
    }
    match to.assertion() {
        Some(assertion) => rendered.map(|c| format!("{}{}", c, assertion)),
        None => rendered,
    }
}

fn render_map<'a>(g: &GoGenerator<'a>, map: &'a MapLiteral) -> Result<Rendered, CodegenError> {
    let mut entries = Vec::with_capacity(map.entries.len());
    for entry in &map.entries {
        let key = go_quote(g.resolve(entry.key.symbol()));
        let value = render_expression(g, &entry.value)?;
        entries.push(value.map(|v| format!("{}: {}", key, v)));
    }
    Ok(Rendered::join(entries, ", ").map(|c| format!("map[string]interface{{}}{{{}}}", c)))
}

fn render_member<'a>(g: &GoGenerator<'a>, member: &'a MemberExpr) -> Result<Rendered, CodegenError> {
    let object = render_expression(g, &member.object)?;
    let property = g.resolve(member.property.symbol);

    Ok(match g.shape_of(&member.object) {
        Shape::Record(_) => object.map(|o| format!("{}.{}", o, capitalize(property))),
        Shape::Map => object.map(|o| format!("{}[{}]", o, go_quote(property))),
        _ => object.map(|o| format!("{}.(map[string]interface{{}})[{}]", o, go_quote(property))),
    })
}

fn render_index<'a>(g: &GoGenerator<'a>, index: &'a IndexExpr) -> Result<Rendered, CodegenError> {
    let object_shape = g.shape_of(&index.object);
    let index_shape = g.shape_of(&index.index);
    let object = render_expression(g, &index.object)?;
    let key = render_expression(g, &index.index)?;

    let (object, key) = match object_shape {
        Shape::List => (object, coerce(key, index_shape, Shape::Int)),
        Shape::Map => (object, coerce(key, index_shape, Shape::String)),
        Shape::Record(_) => (object, key),
        _ if index_shape == Shape::Int => (object.map(|o| format!("{}.([]interface{{}})", o)), key),
        _ => (
            object.map(|o| format!("{}.(map[string]interface{{}})", o)),
            coerce(key, index_shape, Shape::String),
        ),
    };

    let mut caps = object.caps;
    caps.merge(key.caps);
    Ok(Rendered::with_caps(format!("{}[{}]", object.code, key.code), caps))
}

fn render_infix<'a>(g: &GoGenerator<'a>, infix: &'a InfixExpr) -> Result<Rendered, CodegenError> {
    let left_shape = g.shape_of(&infix.left);
    let right_shape = g.shape_of(&infix.right);
    let target = match (left_shape, right_shape) {
        (Shape::Any, other) | (other, Shape::Any) if other.is_primitive() => other,
        _ => Shape::Any,
    };

    let left = coerce(render_expression(g, &infix.left)?, left_shape, target);
    let right = coerce(render_expression(g, &infix.right)?, right_shape, target);
    let op = format!(" {} ", infix.op.as_str());
    Ok(Rendered::join(vec![left, right], &op).map(|c| format!("({})", c)))
}

fn render_call<'a>(g: &GoGenerator<'a>, call: &'a CallExpr) -> Result<Rendered, CodegenError> {
    if let Expression::Member(member) = &*call.callee {
        if let Some(object) = member.object.as_ident() {
            if g.resolve(object.symbol) == BUILTIN_OBJECT && !g.is_bound(object.symbol) {
                match g.resolve(member.property.symbol) {
                    "serve" => return lower_serve(g, call),
                    "static" => return lower_static(g, call),
                    "route" => return lower_route(g, call),
                    _ => {}
                }
            }
        }
    }

    let signature = call
        .callee
        .as_ident()
        .filter(|callee| !g.is_bound(callee.symbol))
        .and_then(|callee| g.symbols().get_function(callee.symbol));

    if let Some(callee) = call.callee.as_ident() {
        if signature.is_none() && !g.is_bound(callee.symbol) && g.resolve(callee.symbol) == "print" {
            let args = render_all(g, &call.args)?;
            return Ok(Rendered::join(args, ", ")
                .map(|a| format!("fmt.Println({})", a))
                .require(Capability::Fmt));
        }
    }

    let callee = render_expression(g, &call.callee)?;
    let mut args = Vec::with_capacity(call.args.len());
    for (i, arg) in call.args.iter().enumerate() {
        let target = signature
            .and_then(|sig| sig.params.get(i))
            .map(|param| g.annotation_shape(param.ty))
            .unwrap_or(Shape::Any);
        args.push(render_as(g, arg, target)?);
    }
    let args = Rendered::join(args, ", ");

    let mut caps = callee.caps;
    caps.merge(args.caps);
    Ok(Rendered::with_caps(format!("{}({})", callee.code, args.code), caps))
}

#[cfg(test)]
mod tests {
    use super::super::generate;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn go(source: &str) -> String {
        let (tokens, interner) = tokenize(source);
        let result = parse(&tokens, source);
        assert!(result.errors.is_empty(), "Parse errors: {:?}", result.errors);
        generate(&result.ast, &interner).unwrap()
    }

    #[test]
    fn test_literals() {
        let src = go("let xs = [1, \"a\"]\nlet m = { \"k\": 1, v: [2] }");
        assert!(src.contains("var xs = []interface{}{1, \"a\"}"));
        assert!(src.contains("var m = map[string]interface{}{\"k\": 1, \"v\": []interface{}{2}}"));
    }

    #[test]
    fn test_member_on_map_literal_and_any() {
        let src = go("let m = { a: { b: 1 } }\nprint(m.a.b)");
        assert!(src.contains("fmt.Println(m[\"a\"].(map[string]interface{})[\"b\"])"));
    }

    #[test]
    fn test_index_on_any_uses_assertion() {
        let src = go("fn f(x) { return x[0] + x[\"k\"] }");
        assert!(src.contains("return (x.([]interface{})[0] + x.(map[string]interface{})[\"k\"])"));
    }

    #[test]
    fn test_infix_asserts_dynamic_operand() {
        let src = go("fn greet(name) { return \"Hello, \" + name }");
        assert!(src.contains("return (\"Hello, \" + name.(string))"));
    }

    #[test]
    fn test_call_arguments_asserted_to_parameter_types() {
        let src = go("fn double(n: int): int { return n * 2 }\nfn f(x) { return double(x) }");
        assert!(src.contains("return double(x.(int))"));
    }

    #[test]
    fn test_map_literal_argument_becomes_record() {
        let src = go(
            "type U = { id: int, tag: { label: string } }\n\
             fn show(u: U) { print(u.id) }\n\
             fn make(): U { return { id: 2 } }\n\
             show({ id: 1, tag: { label: \"x\" } })",
        );
        assert!(src.contains("\tshow(U{Id: 1, Tag: struct{Label string}{Label: \"x\"}})\n"));
        assert!(src.contains("\treturn U{Id: 2, Tag: struct{"));
        assert!(!src.contains("map[string]interface{}{\"id\""));
    }

    #[test]
    fn test_shadowed_print_is_plain_call() {
        let src = go("let print = fn(x) { return x }\nprint(1)");
        assert!(src.contains("\tprint(1)\n"));
        assert!(!src.contains("fmt.Println"));
    }
}
