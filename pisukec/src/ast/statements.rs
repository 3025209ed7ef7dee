///
/// Statement AST Nodes
///
/// This module defines all statement types in the pisuke language.
///
/// Key statement categories:
/// - Declarations: let, const (optionally annotated), type
/// - Control flow: return
/// - Grouping: block
/// - Expression statements: expressions used for side effects
///
/// Design notes:
/// - LetStmt and ConstStmt share a shape but stay distinct so downstream
///   passes can lower them differently
/// - ReturnStmt carries an optional value; `return }` is legal
///

use crate::source::{Span, Spanned};
use super::expressions::Expression;
use super::types::{Ident, TypeDefinition};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let(LetStmt),
    Const(ConstStmt),
    Return(ReturnStmt),
    Expression(ExprStmt),
    TypeDef(TypeDefinition),
    Block(BlockStmt),
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Let(s) => s.span,
            Statement::Const(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Expression(s) => s.span,
            Statement::TypeDef(s) => s.span,
            Statement::Block(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: Ident,
    pub ty: Option<Ident>,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstStmt {
    pub name: Ident,
    pub ty: Option<Ident>,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl BlockStmt {
    /// Whether control cannot fall off the end of the block.
    pub fn ends_with_return(&self) -> bool {
        matches!(self.statements.last(), Some(Statement::Return(_)))
    }
}

/// The parts of `let` and `const` that analysis treats alike.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub name: Ident,
    pub ty: Option<Ident>,
    pub value: &'a Expression,
    pub is_const: bool,
}

impl Statement {
    pub fn as_binding(&self) -> Option<Binding<'_>> {
        match self {
            Statement::Let(s) => Some(Binding {
                name: s.name,
                ty: s.ty,
                value: &s.value,
                is_const: false,
            }),
            Statement::Const(s) => Some(Binding {
                name: s.name,
                ty: s.ty,
                value: &s.value,
                is_const: true,
            }),
            _ => None,
        }
    }
}
