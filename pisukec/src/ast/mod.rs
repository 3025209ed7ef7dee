///
/// Abstract Syntax Tree Module
///
/// This module defines the AST for the pisuke language. The AST is produced
/// by the parser (or assembled by the module loader) and then only read:
/// the type checker and the Go generator both take it by shared reference.
///
/// Module structure:
/// - types: Identifiers and record type definitions
/// - expressions: All expression node types
/// - statements: All statement node types
/// - visitor: Visitor pattern for AST traversal
/// - printer: Source-like text form used by `pisuke debug`
///
/// The root AST node is Program, an ordered list of top-level statements.
///

pub mod expressions;
pub mod printer;
pub mod statements;
pub mod types;
pub mod visitor;

pub use expressions::*;
pub use printer::{render_expression, render_program};
pub use statements::*;
pub use types::*;
pub use visitor::*;

use crate::source::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Self { statements, span }
    }

    pub fn empty() -> Self {
        Self {
            statements: Vec::new(),
            span: Span::dummy(),
        }
    }

    pub fn type_definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Statement::TypeDef(def) => Some(def),
            _ => None,
        })
    }

    /// Named function literals bound at top level, either as a bare
    /// expression statement or as the value of a `let`/`const`.
    pub fn declared_functions(&self) -> impl Iterator<Item = &FunctionLiteral> {
        self.statements.iter().filter_map(declared_function)
    }
}

/// The declared function a top-level statement introduces, if any.
pub fn declared_function(stmt: &Statement) -> Option<&FunctionLiteral> {
    let expr = match stmt {
        Statement::Expression(s) => &s.expr,
        Statement::Let(s) => &s.value,
        Statement::Const(s) => &s.value,
        _ => return None,
    };
    match expr {
        Expression::Function(f) if f.name.is_some() => Some(f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_empty() {
        let program = Program::empty();
        assert!(program.statements.is_empty());
        assert_eq!(program.type_definitions().count(), 0);
        assert_eq!(program.declared_functions().count(), 0);
    }
}
