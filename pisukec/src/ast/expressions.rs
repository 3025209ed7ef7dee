//!
//! Expression AST Nodes
//!
//! This module defines all expression types in the pisuke language.
//!
//! Key design decisions:
//! - Wrapper enum with separate structs for each expression type
//! - Each struct carries its own Span for precise error reporting
//! - Box-based nesting; the tree is built once and only read afterwards
//! - All types implement Spanned trait for uniform span access
//!
//! Expression categories:
//! - Atoms: identifiers, integer and string literals
//! - Constructors: list literals, map literals, function literals
//! - Access: member access, indexing, calls
//! - Operators: `+` and `*`
//!

use lasso::Spur;

use crate::source::{Span, Spanned};
use super::statements::BlockStmt;
use super::types::Ident;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Ident),
    Int(IntLiteral),
    String(StringLiteral),
    List(ListLiteral),
    Map(MapLiteral),
    Index(IndexExpr),
    Member(MemberExpr),
    Infix(InfixExpr),
    Function(FunctionLiteral),
    Call(CallExpr),
}

impl Spanned for Expression {
    fn span(&self) -> Span {
        match self {
            Expression::Identifier(e) => e.span,
            Expression::Int(e) => e.span,
            Expression::String(e) => e.span,
            Expression::List(e) => e.span,
            Expression::Map(e) => e.span,
            Expression::Index(e) => e.span,
            Expression::Member(e) => e.span,
            Expression::Infix(e) => e.span,
            Expression::Function(e) => e.span,
            Expression::Call(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntLiteral {
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringLiteral {
    pub value: Spur,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLiteral {
    pub elements: Vec<Expression>,
    pub span: Span,
}

/// Entries are kept in source order; lookups treat them as a set of keys.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLiteral {
    pub entries: Vec<MapEntry>,
    pub span: Span,
}

impl MapLiteral {
    pub fn get(&self, key: Spur) -> Option<&Expression> {
        self.entries
            .iter()
            .find(|e| e.key.symbol() == key)
            .map(|e| &e.value)
    }

    pub fn has_key(&self, key: Spur) -> bool {
        self.entries.iter().any(|e| e.key.symbol() == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: MapKey,
    pub value: Expression,
    pub span: Span,
}

/// `{ "name": v }` and `{ name: v }` denote the same key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapKey {
    String(StringLiteral),
    Ident(Ident),
}

impl MapKey {
    pub fn symbol(&self) -> Spur {
        match self {
            MapKey::String(s) => s.value,
            MapKey::Ident(i) => i.symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expression>,
    pub property: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOp {
    Add,
    Mul,
}

impl InfixOp {
    pub fn precedence(&self) -> u8 {
        match self {
            InfixOp::Add => 1,
            InfixOp::Mul => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Mul => "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpr {
    pub left: Box<Expression>,
    pub op: InfixOp,
    pub right: Box<Expression>,
    pub span: Span,
}

/// `fn [name](a: int, b) [: Ret] { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub name: Option<Ident>,
    pub params: Vec<Parameter>,
    pub return_ty: Option<Ident>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Ident,
    pub ty: Option<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expression>,
    pub args: Vec<Expression>,
    pub span: Span,
}

impl Expression {
    /// The identifier this expression names, if it is a bare identifier.
    pub fn as_ident(&self) -> Option<Ident> {
        match self {
            Expression::Identifier(ident) => Some(*ident),
            _ => None,
        }
    }
}
