///
/// Statement Code Generation
///
/// Converts pisuke statements to Go statements:
/// - `let` -> `var x = e` followed by `_ = x` (Go rejects unused locals)
/// - annotated `let` of a record -> a struct literal in declared field order
/// - `const` of an int or string literal -> `const x = e`
/// - `return` -> depends on the enclosing body (main, func, route handler)
/// - expression statements -> calls as is, anything else as `_ = e`
/// - blocks -> `{ ... }`, nested type definitions -> local `type` decls
///
/// Function literals are emitted here too, by a child generator for the
/// body; they render to `func(p T, ...) R { ... }`.
///

use std::collections::{HashMap, HashSet};

use lasso::Spur;

use crate::ast::{
    declared_function, walk_expr, Binding, Expression, FunctionLiteral, MapLiteral,
    Program, ReturnStmt, Statement, TypeDefinition, Visitor,
};
use crate::codegen::CodegenError;

use super::capabilities::Rendered;
use super::expressions::{coerce, render_expression};
use super::shapes::Shape;
use super::types::{capitalize, emit_type_decl, field_zero_value, go_type, inline_struct, zero_value};
use super::{GoGenerator, ReturnMode};

pub(super) fn emit_statements<'a>(
    g: &mut GoGenerator<'a>,
    statements: &'a [Statement],
) -> Result<(), CodegenError> {
    for stmt in statements {
        emit_statement(g, stmt)?;
    }
    Ok(())
}

/// Where a binding is declared. Go rejects unused locals but not unused
/// package-level variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Local,
    Package,
}

/// Identifiers an expression or body reads. Member properties and map keys
/// are names, not references.
#[derive(Default)]
struct References(HashSet<Spur>);

impl<'ast> Visitor<'ast> for References {
    fn visit_expr(&mut self, expr: &'ast Expression) {
        match expr {
            Expression::Identifier(ident) => {
                self.0.insert(ident.symbol);
            }
            Expression::Member(member) => self.visit_expr(&member.object),
            _ => walk_expr(self, expr),
        }
    }
}

/// Top-level bindings that must live at package level. Declared functions
/// are Go funcs outside `main`, so every top-level binding they read,
/// and every binding those read in turn, is declared beside them.
pub(super) fn package_bindings(program: &Program) -> HashSet<Spur> {
    let mut values: HashMap<Spur, &Expression> = HashMap::new();
    for stmt in &program.statements {
        let Some(binding) = stmt.as_binding() else { continue };
        let names_function = declared_function(stmt)
            .and_then(|func| func.name)
            .is_some_and(|name| name.symbol == binding.name.symbol);
        if !names_function {
            values.insert(binding.name.symbol, binding.value);
        }
    }

    let mut refs = References::default();
    for func in program.declared_functions() {
        refs.visit_function(func);
    }

    let mut hoisted = HashSet::new();
    let mut pending: Vec<Spur> = refs.0.into_iter().collect();
    while let Some(name) = pending.pop() {
        let Some(value) = values.get(&name) else { continue };
        if !hoisted.insert(name) {
            continue;
        }
        let mut inner = References::default();
        inner.visit_expr(value);
        pending.extend(inner.0);
    }
    hoisted
}

/// A top-level binding declared at package level, ahead of the funcs that
/// read it.
pub(super) fn emit_package_statement<'a>(
    g: &mut GoGenerator<'a>,
    stmt: &'a Statement,
) -> Result<(), CodegenError> {
    let Some(binding) = stmt.as_binding() else {
        return Ok(());
    };
    match declared_function(stmt).and_then(|func| func.name) {
        Some(func_name) => {
            if func_name.symbol != binding.name.symbol {
                let alias = g.resolve(binding.name.symbol);
                g.write_line(&format!("var {} = {}", alias, g.resolve(func_name.symbol)));
                g.define(binding.name.symbol, Shape::Func);
            }
            Ok(())
        }
        None => emit_binding(g, binding, Placement::Package),
    }
}

/// A top-level statement inside `func main()`. Declared functions were
/// already hoisted; a binding under a different name becomes an alias.
pub(super) fn emit_main_statement<'a>(
    g: &mut GoGenerator<'a>,
    stmt: &'a Statement,
) -> Result<(), CodegenError> {
    let Some(func) = declared_function(stmt) else {
        return emit_statement(g, stmt);
    };
    if let (Some(binding), Some(func_name)) = (stmt.as_binding(), func.name) {
        if binding.name.symbol != func_name.symbol {
            let alias = g.resolve(binding.name.symbol);
            g.write_line(&format!("var {} = {}", alias, g.resolve(func_name.symbol)));
            g.write_line(&format!("_ = {}", alias));
            g.define(binding.name.symbol, Shape::Func);
        }
    }
    Ok(())
}

pub(super) fn emit_statement<'a>(
    g: &mut GoGenerator<'a>,
    stmt: &'a Statement,
) -> Result<(), CodegenError> {
    match stmt {
        Statement::Let(_) | Statement::Const(_) => match stmt.as_binding() {
            Some(binding) => emit_binding(g, binding, Placement::Local),
            None => Ok(()),
        },
        Statement::Return(ret) => emit_return(g, ret),
        Statement::Expression(expr_stmt) => {
            let rendered = render_expression(g, &expr_stmt.expr)?;
            let code = g.absorb(rendered);
            match expr_stmt.expr {
                Expression::Call(_) => g.write_line(&code),
                _ => g.write_line(&format!("_ = {}", code)),
            }
            Ok(())
        }
        Statement::TypeDef(def) => {
            emit_type_decl(g, def);
            Ok(())
        }
        Statement::Block(block) => {
            g.write_line("{");
            g.indent += 1;
            g.push_scope();
            let result = emit_statements(g, &block.statements);
            g.pop_scope();
            g.indent -= 1;
            g.write_line("}");
            result
        }
    }
}

fn emit_binding<'a>(
    g: &mut GoGenerator<'a>,
    binding: Binding<'a>,
    placement: Placement,
) -> Result<(), CodegenError> {
    let name = g.resolve(binding.name.symbol);
    let declared = g.annotation_shape(binding.ty);
    let value_shape = g.shape_of(binding.value);

    let is_literal = matches!(binding.value, Expression::Int(_) | Expression::String(_));
    if binding.is_const && is_literal && (binding.ty.is_none() || declared.is_primitive()) {
        let value = render_expression(g, binding.value)?;
        let code = g.absorb(value);
        match binding.ty {
            Some(_) => g.write_line(&format!("const {} {} = {}", name, go_type(g, binding.ty), code)),
            None => g.write_line(&format!("const {} = {}", name, code)),
        }
        g.define(binding.name.symbol, value_shape);
        return Ok(());
    }

    let (declaration, shape) = match (binding.ty, declared) {
        (Some(ty), Shape::Record(_)) => {
            let value = render_as(g, binding.value, declared)?;
            let code = g.absorb(value);
            (format!("var {} {} = {}", name, g.resolve(ty.symbol), code), declared)
        }
        (Some(_), shape) if shape.is_primitive() => {
            let value = render_as(g, binding.value, shape)?;
            let code = g.absorb(value);
            (format!("var {} {} = {}", name, go_type(g, binding.ty), code), shape)
        }
        _ => {
            let value = render_expression(g, binding.value)?;
            let code = g.absorb(value);
            (format!("var {} = {}", name, code), value_shape)
        }
    };

    g.write_line(&declaration);
    if placement == Placement::Local {
        g.write_line(&format!("_ = {}", name));
    }
    g.define(binding.name.symbol, shape);
    Ok(())
}

/// Render `value` where a value of `shape` is expected. A map literal
/// meeting a record becomes a struct literal, and an `interface{}` meeting
/// a primitive is asserted.
pub(super) fn render_as<'a>(
    g: &GoGenerator<'a>,
    value: &'a Expression,
    shape: Shape<'a>,
) -> Result<Rendered, CodegenError> {
    match (value, shape) {
        (Expression::Map(map), Shape::Record(def)) => {
            render_record_literal(g, def, &record_type_text(g, def), map)
        }
        _ => Ok(coerce(render_expression(g, value)?, g.shape_of(value), shape)),
    }
}

/// A registered record is named; a nested one is an anonymous struct.
fn record_type_text(g: &GoGenerator, def: &TypeDefinition) -> String {
    match g.symbols().get_type(def.name.symbol) {
        Some(registered) if std::ptr::eq(registered, def) => g.resolve(def.name.symbol).to_string(),
        _ => inline_struct(g, def),
    }
}

/// `T{A: a, B: b}` with fields in the definition's order. Absent fields get
/// their zero value; extra keys in the literal are dropped.
fn render_record_literal<'a>(
    g: &GoGenerator<'a>,
    def: &'a TypeDefinition,
    type_text: &str,
    map: &'a MapLiteral,
) -> Result<Rendered, CodegenError> {
    let mut fields = Vec::with_capacity(def.fields.len());

    for field in &def.fields {
        let field_name = capitalize(g.resolve(field.name.symbol));
        let value = match map.get(field.name.symbol) {
            None => Rendered::new(field_zero_value(g, field)),
            Some(value) => render_as(g, value, g.field_shape(field))?,
        };
        fields.push(value.map(|v| format!("{}: {}", field_name, v)));
    }

    Ok(Rendered::join(fields, ", ").map(|f| format!("{}{{{}}}", type_text, f)))
}

fn emit_return<'a>(g: &mut GoGenerator<'a>, ret: &'a ReturnStmt) -> Result<(), CodegenError> {
    let mode = g.returns.clone();
    let value = match (&ret.value, &mode) {
        (Some(value), ReturnMode::Function { shape, .. }) => Some(render_as(g, value, *shape)?),
        (Some(value), _) => Some(render_expression(g, value)?),
        (None, _) => None,
    };
    let value = value.map(|v| g.absorb(v));

    match (mode, value) {
        (ReturnMode::Main, Some(value)) => {
            g.write_line(&format!("_ = {}", value));
            g.write_line("return");
        }
        (ReturnMode::Main, None) => g.write_line("return"),
        (ReturnMode::Function { .. }, Some(value)) => g.write_line(&format!("return {}", value)),
        (ReturnMode::Function { zero, .. }, None) => g.write_line(&format!("return {}", zero)),
        (ReturnMode::Handler, Some(value)) => g.write_line(&format!("returnValue = {}", value)),
        (ReturnMode::Handler, None) => g.write_line("returnValue = nil"),
    }
    Ok(())
}

/// Emit a hoisted top-level `func name(...) R { ... }`.
pub(super) fn emit_declared_function<'a>(
    g: &mut GoGenerator<'a>,
    func: &'a FunctionLiteral,
) -> Result<(), CodegenError> {
    let name = func.name.map(|n| g.resolve(n.symbol));
    let rendered = render_function(g, func, name)?;
    let code = g.absorb(rendered);
    g.write_line(&code);
    Ok(())
}

/// `func [name](p T, ...) R { ... }`. Untyped parameters and returns are
/// `interface{}`; a body that can fall off its end gets a zero-value return.
pub(super) fn render_function<'a>(
    g: &GoGenerator<'a>,
    func: &'a FunctionLiteral,
    name: Option<&str>,
) -> Result<Rendered, CodegenError> {
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{} {}", g.resolve(p.name.symbol), go_type(g, p.ty)))
        .collect();
    let return_ty = go_type(g, func.return_ty);
    let zero = zero_value(g, func.return_ty);

    let mut body = g.child(
        g.indent + 1,
        ReturnMode::Function {
            zero: zero.clone(),
            shape: g.annotation_shape(func.return_ty),
        },
    );
    for param in &func.params {
        body.define(param.name.symbol, g.annotation_shape(param.ty));
    }
    emit_statements(&mut body, &func.body.statements)?;
    if !func.body.ends_with_return() {
        body.write_line(&format!("return {}", zero));
    }
    let (code, caps) = body.finish();

    let header = match name {
        Some(name) => format!("func {}", name),
        None => "func".to_string(),
    };
    Ok(Rendered::with_caps(
        format!(
            "{}({}) {} {{\n{}{}}}",
            header,
            params.join(", "),
            return_ty,
            code,
            g.indentation()
        ),
        caps,
    ))
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
    fn test_typed_record_literal_in_declared_order() {
        let src = go(
            "type User = { id: int, name: { n: string } }\nlet u: User = { name: { n: \"Alice\" }, \"id\": 1 }\nprint(u.name.n)",
        );
        assert!(src.contains(
            "\tvar u User = User{Id: 1, Name: struct{N string}{N: \"Alice\"}}\n\t_ = u\n"
        ));
        assert!(src.contains("fmt.Println(u.Name.N)"));
        assert!(src.contains("type User struct {\n\tId int\n\tName struct {\n\t\tN string\n\t}\n}\n"));
    }

    #[test]
    fn test_missing_fields_get_zero_values() {
        let src = go("type P = { x: int, s: string, q: Q, n: { a: int }, any: thing }\ntype Q = { v: int }\nlet p: P = {}");
        assert!(src.contains("var p P = P{X: 0, S: \"\", Q: Q{}, N: struct{A int}{}, Any: nil}"));
    }

    #[test]
    fn test_const_lowering() {
        let src = go("const port = 8080\nconst xs = [1]");
        assert!(src.contains("\tconst port = 8080\n"));
        assert!(src.contains("\tvar xs = []interface{}{1}\n\t_ = xs\n"));
    }

    #[test]
    fn test_primitive_annotation() {
        let src = go("let n: int = 3");
        assert!(src.contains("\tvar n int = 3\n"));
    }

    #[test]
    fn test_non_call_expression_statement() {
        let src = go("let a = 1\na + 2");
        assert!(src.contains("\t_ = (a + 2)\n"));
    }

    #[test]
    fn test_function_literal_gets_default_return() {
        let src = go("let f = fn(x) { print(x) }");
        assert!(src.contains(
            "\tvar f = func(x interface{}) interface{} {\n\t\tfmt.Println(x)\n\t\treturn nil\n\t}\n"
        ));
    }

    #[test]
    fn test_typed_function_zero_return() {
        let src = go("fn count(): int { return }");
        assert!(src.contains("func count() int {\n\treturn 0\n}\n"));
    }

    #[test]
    fn test_declared_function_alias() {
        let src = go("let f = fn g() { return 1 }\nlet h = fn h() { return 2 }");
        assert!(src.contains("func g() interface{} {"));
        assert!(src.contains("func h() interface{} {"));
        assert!(src.contains("\tvar f = g\n\t_ = f\n"));
        assert!(!src.contains("var h"));
    }

    #[test]
    fn test_block_and_local_type() {
        let src = go("{\n  type T = { a: int }\n  let x = 1\n}");
        assert!(src.contains("\t{\n\t\ttype T struct {\n\t\t\tA int\n\t\t}\n\t\tvar x = 1\n\t\t_ = x\n\t}\n"));
    }
}
