//!
//! Type Checker Module
//!
//! This module provides structural checking for pisuke programs. The type
//! checker:
//!
//! 1. Collects all record type definitions (forward references are legal)
//! 2. Collects the signatures of all top-level declared functions
//! 3. Assigns types to top-level bindings, inferring the record type of
//!    unannotated map literals
//! 4. Validates annotated bindings whose value is a map literal against the
//!    declared record, recursively through nested fields
//! 5. Walks every expression, function bodies included, checking member
//!    access against known record types and call arity/argument types
//!    against declared functions
//!
//! This is not general inference: arithmetic and return types are never
//! checked, and anything whose type is unknown passes silently. Checking is
//! pure and never aborts; every problem becomes a TypeError, in the order
//! the passes above find them.
//!
//! Entry point: `check()` takes a Program and its interner and returns the
//! errors.
//!

pub mod env;
pub mod error;
pub mod infer;
pub mod symbols;
pub mod types;

use lasso::Rodeo;

use crate::ast::{
    walk_expr, walk_stmt, Binding, CallExpr, Expression, FieldType, FunctionLiteral, MapLiteral,
    MemberExpr, Program, Statement, TypeDefinition, Visitor,
};
use crate::source::Spanned;

pub use error::TypeError;
pub use symbols::{FunctionSig, SymbolTable};
pub use types::Ty;

use env::TypeEnv;
use infer::{infer_record, static_ty};

pub fn check(program: &Program, interner: &Rodeo) -> Vec<TypeError> {
    let mut checker = TypeChecker::new(SymbolTable::collect(program), interner);
    checker.check_program(program);
    tracing::debug!(errors = checker.errors.len(), "type check finished");
    checker.errors
}

pub struct TypeChecker<'p> {
    symbols: SymbolTable<'p>,
    interner: &'p Rodeo,
    env: TypeEnv<'p>,
    context: String,
    errors: Vec<TypeError>,
}

impl<'p> TypeChecker<'p> {
    pub fn new(symbols: SymbolTable<'p>, interner: &'p Rodeo) -> Self {
        Self {
            symbols,
            interner,
            env: TypeEnv::new(),
            context: String::from("<expr>"),
            errors: Vec::new(),
        }
    }

    pub fn check_program(&mut self, program: &'p Program) {
        for stmt in &program.statements {
            if let Some(binding) = stmt.as_binding() {
                let ty = self.binding_ty(&binding);
                self.env.define(binding.name.symbol, ty);
            }
        }

        for stmt in &program.statements {
            if let Some(binding) = stmt.as_binding() {
                self.validate_binding(&binding);
            }
        }

        for stmt in &program.statements {
            match stmt.as_binding() {
                Some(binding) => {
                    self.context = self.interner.resolve(&binding.name.symbol).to_string();
                    self.visit_expr(binding.value);
                }
                None => {
                    self.context = String::from("<expr>");
                    self.visit_stmt(stmt);
                }
            }
        }
    }

    fn binding_ty(&self, binding: &Binding<'p>) -> Ty<'p> {
        if let Some(ty) = binding.ty {
            return self
                .symbols
                .resolve(ty.symbol, self.interner)
                .unwrap_or(Ty::Unknown);
        }
        match binding.value {
            Expression::Map(map) => infer_record(map, &self.symbols, self.interner)
                .map(Ty::Record)
                .unwrap_or(Ty::Unknown),
            other => static_ty(other, &self.env, &self.symbols, self.interner),
        }
    }

    fn validate_binding(&mut self, binding: &Binding<'p>) {
        let Some(ty) = binding.ty else { return };
        let interner = self.interner;
        let path = interner.resolve(&binding.name.symbol);

        match self.symbols.resolve(ty.symbol, interner) {
            None => self.errors.push(TypeError::UnknownType {
                name: interner.resolve(&ty.symbol).to_string(),
                span: ty.span,
            }),
            Some(Ty::Record(def)) => {
                if let Expression::Map(map) = binding.value {
                    self.validate_record(map, def, path);
                }
            }
            Some(expected) => {
                let found = Ty::of_literal(binding.value);
                if let (Some(expected), Some(found)) = (expected.name(interner), found.name(interner)) {
                    if expected != found {
                        self.errors.push(TypeError::TypeMismatch {
                            path: path.to_string(),
                            expected: expected.to_string(),
                            found: found.to_string(),
                            span: binding.value.span(),
                        });
                    }
                }
            }
        }
    }

    /// Check a map literal against a record definition. Extra keys are fine.
    fn validate_record(&mut self, map: &MapLiteral, def: &'p TypeDefinition, path: &str) {
        let interner = self.interner;

        for field in &def.fields {
            let field_name = interner.resolve(&field.name.symbol);
            let field_path = format!("{}.{}", path, field_name);

            let Some(value) = map.get(field.name.symbol) else {
                self.errors.push(TypeError::MissingField {
                    path: path.to_string(),
                    field: field_name.to_string(),
                    span: map.span,
                });
                continue;
            };

            match &field.ty {
                FieldType::Nested(nested) => match value {
                    Expression::Map(inner) => self.validate_record(inner, nested, &field_path),
                    _ => self.errors.push(TypeError::ExpectedNestedObject {
                        path: field_path,
                        span: value.span(),
                    }),
                },
                FieldType::Named(name) => {
                    if let Some(found) = Ty::of_literal(value).name(interner) {
                        let expected = interner.resolve(&name.symbol);
                        if expected != found {
                            self.errors.push(TypeError::TypeMismatch {
                                path: field_path,
                                expected: expected.to_string(),
                                found: found.to_string(),
                                span: value.span(),
                            });
                        }
                    } else if let Expression::Map(inner) = value {
                        if let Some(record) = self.symbols.get_type(name.symbol) {
                            self.validate_record(inner, record, &field_path);
                        }
                    }
                }
            }
        }
    }

    fn check_member(&mut self, member: &MemberExpr) {
        let object = static_ty(&member.object, &self.env, &self.symbols, self.interner);
        let Some(def) = object.record() else { return };
        if def.field(member.property.symbol).is_none() {
            self.errors.push(TypeError::UnknownField {
                context: self.context.clone(),
                field: self.interner.resolve(&member.property.symbol).to_string(),
                ty: self.interner.resolve(&def.name.symbol).to_string(),
                span: member.property.span,
            });
        }
    }

    fn check_call(&mut self, call: &CallExpr) {
        let Some(callee) = call.callee.as_ident() else { return };
        let Some(sig) = self.symbols.get_function(callee.symbol) else { return };
        let interner = self.interner;
        let function = interner.resolve(&sig.name);

        if call.args.len() != sig.arity() {
            self.errors.push(TypeError::WrongArgCount {
                context: self.context.clone(),
                function: function.to_string(),
                expected: sig.arity(),
                found: call.args.len(),
                span: call.span,
            });
            return;
        }

        let mut mismatches = Vec::new();
        for (index, (arg, param)) in call.args.iter().zip(sig.params).enumerate() {
            let Some(param_ty) = param.ty else { continue };
            let expected = interner.resolve(&param_ty.symbol);
            let found = static_ty(arg, &self.env, &self.symbols, interner);
            if let Some(found) = found.name(interner) {
                if found != expected {
                    mismatches.push(TypeError::ArgTypeMismatch {
                        context: self.context.clone(),
                        function: function.to_string(),
                        index,
                        expected: expected.to_string(),
                        found: found.to_string(),
                        span: arg.span(),
                    });
                }
            }
        }
        self.errors.extend(mismatches);
    }
}

impl<'p> Visitor<'p> for TypeChecker<'p> {
    fn visit_stmt(&mut self, stmt: &'p Statement) {
        match stmt {
            Statement::Let(_) | Statement::Const(_) => {
                let Some(binding) = stmt.as_binding() else { return };
                self.validate_binding(&binding);
                self.visit_expr(binding.value);
                let ty = self.binding_ty(&binding);
                self.env.define(binding.name.symbol, ty);
            }
            Statement::Block(block) => {
                self.env.push_scope();
                for stmt in &block.statements {
                    self.visit_stmt(stmt);
                }
                self.env.pop_scope();
            }
            Statement::TypeDef(_) => {}
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &'p Expression) {
        match expr {
            Expression::Member(member) => self.check_member(member),
            Expression::Call(call) => self.check_call(call),
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, func: &'p FunctionLiteral) {
        let name = match func.name {
            Some(name) => self.interner.resolve(&name.symbol),
            None => "<fn>",
        };
        let saved = std::mem::replace(&mut self.context, name.to_string());

        self.env.push_scope();
        for param in &func.params {
            let ty = param
                .ty
                .and_then(|ty| self.symbols.resolve(ty.symbol, self.interner))
                .unwrap_or(Ty::Unknown);
            self.env.define(param.name.symbol, ty);
        }
        for stmt in &func.body.statements {
            self.visit_stmt(stmt);
        }
        self.env.pop_scope();

        self.context = saved;
    }
}
