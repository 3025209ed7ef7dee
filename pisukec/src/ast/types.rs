///
/// Type-Level AST Nodes
///
/// Identifiers and record type definitions. pisuke has no type expressions
/// beyond names: an annotation is a single identifier (`int`, `string`, or
/// a declared record), and a record definition is a tree of named fields
/// whose leaves are such names.
///
/// Design notes:
/// - A nested field owns its own TypeDefinition, named after the field, so
///   the definition tree can be walked without a registry
/// - Field order is declaration order and is significant for codegen
///

use lasso::Spur;

use crate::source::{Span, Spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident {
    pub symbol: Spur,
    pub span: Span,
}

impl Ident {
    pub fn new(symbol: Spur, span: Span) -> Self {
        Self { symbol, span }
    }
}

impl Spanned for Ident {
    fn span(&self) -> Span {
        self.span
    }
}

/// `type Name = { field: Type, nested: { ... } }`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: Ident,
    pub fields: Vec<Field>,
    pub span: Span,
}

impl TypeDefinition {
    pub fn field(&self, name: Spur) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.symbol == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub ty: FieldType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Named(Ident),
    Nested(TypeDefinition),
}

impl Spanned for TypeDefinition {
    fn span(&self) -> Span {
        self.span
    }
}
