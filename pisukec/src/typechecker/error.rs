///
/// Type Checker Error Types
///
/// This module defines the diagnostics of the checking phase. Each variant
/// carries the span of the offending node for miette rendering, while its
/// Display is the plain one-line message printed by `pisuke check`.
///
/// Error categories:
/// - UnknownType: An annotation names neither a primitive nor a declared type
/// - MissingField: A record literal lacks a declared field
/// - ExpectedNestedObject: A nested field holds something other than a map literal
/// - TypeMismatch: A literal's kind disagrees with the declared primitive type
/// - UnknownField: Member access names a field the record does not declare
/// - WrongArgCount: Call arity differs from the declared function's
/// - ArgTypeMismatch: A call argument's known type disagrees with the parameter's
///

use crate::source::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("unknown type: {name}")]
    UnknownType { name: String, span: Span },

    #[error("{path}: missing field '{field}'")]
    MissingField {
        path: String,
        field: String,
        span: Span,
    },

    #[error("{path}: expected nested object")]
    ExpectedNestedObject { path: String, span: Span },

    #[error("{path}: type mismatch, expected {expected} got {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("{context}: unknown field '{field}' on type {ty}")]
    UnknownField {
        context: String,
        field: String,
        ty: String,
        span: Span,
    },

    #[error("{context}: function {function} expects {expected} args, got {found}")]
    WrongArgCount {
        context: String,
        function: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{context}: arg {index} for {function}: expected {expected} got {found}")]
    ArgTypeMismatch {
        context: String,
        function: String,
        index: usize,
        expected: String,
        found: String,
        span: Span,
    },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::UnknownType { span, .. }
            | TypeError::MissingField { span, .. }
            | TypeError::ExpectedNestedObject { span, .. }
            | TypeError::TypeMismatch { span, .. }
            | TypeError::UnknownField { span, .. }
            | TypeError::WrongArgCount { span, .. }
            | TypeError::ArgTypeMismatch { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_check_output() {
        let err = TypeError::MissingField {
            path: "u".into(),
            field: "name".into(),
            span: Span::dummy(),
        };
        assert_eq!(err.to_string(), "u: missing field 'name'");

        let err = TypeError::WrongArgCount {
            context: "<expr>".into(),
            function: "add".into(),
            expected: 2,
            found: 1,
            span: Span::dummy(),
        };
        assert_eq!(err.to_string(), "<expr>: function add expects 2 args, got 1");
    }
}
