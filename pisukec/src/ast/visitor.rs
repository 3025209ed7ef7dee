//!
//! AST Visitor Pattern
//!
//! A visitor trait for traversing the AST. Implementors override only the
//! methods they need; the defaults call the walk_* functions, which recurse
//! into every child in source order.
//!
//! The `'ast` lifetime lets a visitor keep references into the tree it is
//! walking (the type checker records bindings this way).
//!
//! Common use cases:
//! - Type checking: member access and call arity checks
//! - Analysis: finding returns inside a handler body
//!

use super::expressions::*;
use super::statements::*;
use super::types::*;

pub trait Visitor<'ast>: Sized {
    fn visit_stmt(&mut self, stmt: &'ast Statement) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &'ast Expression) {
        walk_expr(self, expr)
    }

    fn visit_type_def(&mut self, def: &'ast TypeDefinition) {
        walk_type_def(self, def)
    }

    fn visit_function(&mut self, func: &'ast FunctionLiteral) {
        walk_function(self, func)
    }

    fn visit_ident(&mut self, _ident: &'ast Ident) {}
}

pub fn walk_stmt<'ast, V: Visitor<'ast>>(v: &mut V, stmt: &'ast Statement) {
    match stmt {
        Statement::Let(s) => {
            v.visit_ident(&s.name);
            if let Some(ref ty) = s.ty {
                v.visit_ident(ty);
            }
            v.visit_expr(&s.value);
        }
        Statement::Const(s) => {
            v.visit_ident(&s.name);
            if let Some(ref ty) = s.ty {
                v.visit_ident(ty);
            }
            v.visit_expr(&s.value);
        }
        Statement::Return(s) => {
            if let Some(ref value) = s.value {
                v.visit_expr(value);
            }
        }
        Statement::Expression(s) => v.visit_expr(&s.expr),
        Statement::TypeDef(def) => v.visit_type_def(def),
        Statement::Block(block) => {
            for stmt in &block.statements {
                v.visit_stmt(stmt);
            }
        }
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast>>(v: &mut V, expr: &'ast Expression) {
    match expr {
        Expression::Identifier(ident) => v.visit_ident(ident),
        Expression::Int(_) | Expression::String(_) => {}
        Expression::List(list) => {
            for elem in &list.elements {
                v.visit_expr(elem);
            }
        }
        Expression::Map(map) => {
            for entry in &map.entries {
                v.visit_expr(&entry.value);
            }
        }
        Expression::Index(index) => {
            v.visit_expr(&index.object);
            v.visit_expr(&index.index);
        }
        Expression::Member(member) => {
            v.visit_expr(&member.object);
            v.visit_ident(&member.property);
        }
        Expression::Infix(infix) => {
            v.visit_expr(&infix.left);
            v.visit_expr(&infix.right);
        }
        Expression::Function(func) => v.visit_function(func),
        Expression::Call(call) => {
            v.visit_expr(&call.callee);
            for arg in &call.args {
                v.visit_expr(arg);
            }
        }
    }
}

pub fn walk_function<'ast, V: Visitor<'ast>>(v: &mut V, func: &'ast FunctionLiteral) {
    if let Some(ref name) = func.name {
        v.visit_ident(name);
    }
    for param in &func.params {
        v.visit_ident(&param.name);
        if let Some(ref ty) = param.ty {
            v.visit_ident(ty);
        }
    }
    if let Some(ref ret) = func.return_ty {
        v.visit_ident(ret);
    }
    for stmt in &func.body.statements {
        v.visit_stmt(stmt);
    }
}

pub fn walk_type_def<'ast, V: Visitor<'ast>>(v: &mut V, def: &'ast TypeDefinition) {
    v.visit_ident(&def.name);
    for field in &def.fields {
        v.visit_ident(&field.name);
        match &field.ty {
            FieldType::Named(ty) => v.visit_ident(ty),
            FieldType::Nested(nested) => v.visit_type_def(nested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    #[derive(Default)]
    struct Counter {
        exprs: usize,
        functions: usize,
        type_defs: usize,
    }

    impl<'ast> Visitor<'ast> for Counter {
        fn visit_expr(&mut self, expr: &'ast Expression) {
            self.exprs += 1;
            walk_expr(self, expr)
        }

        fn visit_function(&mut self, func: &'ast FunctionLiteral) {
            self.functions += 1;
            walk_function(self, func)
        }

        fn visit_type_def(&mut self, def: &'ast TypeDefinition) {
            self.type_defs += 1;
            walk_type_def(self, def)
        }
    }

    #[test]
    fn test_visitor_reaches_nested_nodes() {
        let source = "type T = { a: { b: int } }\nlet f = fn(x) { return x + 1 }";
        let (tokens, _) = tokenize(source);
        let result = parse(&tokens, source);
        assert!(result.errors.is_empty(), "Errors: {:?}", result.errors);

        let mut counter = Counter::default();
        for stmt in &result.ast.statements {
            counter.visit_stmt(stmt);
        }
        assert_eq!(counter.type_defs, 2);
        assert_eq!(counter.functions, 1);
        // fn literal, infix, x, 1
        assert_eq!(counter.exprs, 4);
    }
}
